// src/executor.rs

//! The executor contract (§6): the caller-supplied capability set a task's
//! `func` is dispatched against.

use crate::task::TaskInputs;

/// Caller-supplied object carrying the named operations a task may invoke.
///
/// For a task whose `func` is `"op"` and `inputs` is `{k1: v1, k2: v2}`, the
/// scheduler calls `call("op", retry, &inputs)` — the Rust rendering of
/// `executor.op(retry=<attempt>, k1=v1, k2=v2)`. A normal return is success;
/// any `Err` is a retryable failure. Implementations must tolerate being
/// called up to `max_retry` times for the same task in quick succession.
///
/// `Send + Sync` because the same executor instance is shared across every
/// worker thread.
pub trait Executor: Send + Sync {
    fn call(&self, func: &str, retry: u32, inputs: &TaskInputs) -> anyhow::Result<serde_json::Value>;
}
