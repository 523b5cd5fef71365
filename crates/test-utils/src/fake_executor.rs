use std::collections::HashMap;
use std::sync::Mutex;

use taskgraph::{Executor, TaskInputs};

/// What a [`FakeExecutor`] does when a given `func` is invoked.
#[derive(Clone)]
pub enum Behaviour {
    /// Always succeed with this value.
    Succeed(serde_json::Value),
    /// Always fail with this message.
    Fail(String),
    /// Fail on every call except the last allowed retry, which succeeds —
    /// useful for exercising the retry loop without exhausting it.
    FailUntil { attempt: u32, value: serde_json::Value },
}

/// A recording, programmable executor for tests.
///
/// Every call is recorded as `(func, retry)` in call order, and each `func`
/// name maps to a [`Behaviour`] registered up front. Defaults to succeeding
/// with `null` for any `func` with no registered behaviour.
pub struct FakeExecutor {
    behaviours: HashMap<String, Behaviour>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        FakeExecutor {
            behaviours: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, func: impl Into<String>, behaviour: Behaviour) -> Self {
        self.behaviours.insert(func.into(), behaviour);
        self
    }

    /// `(func, retry)` pairs in the order the scheduler invoked them.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, func: &str) -> usize {
        self.calls().iter().filter(|(f, _)| f == func).count()
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for FakeExecutor {
    fn call(
        &self,
        func: &str,
        retry: u32,
        _inputs: &TaskInputs,
    ) -> anyhow::Result<serde_json::Value> {
        self.calls.lock().unwrap().push((func.to_string(), retry));

        match self.behaviours.get(func) {
            Some(Behaviour::Succeed(value)) => Ok(value.clone()),
            Some(Behaviour::Fail(msg)) => Err(anyhow::anyhow!(msg.clone())),
            Some(Behaviour::FailUntil { attempt, value }) => {
                if retry >= *attempt {
                    Ok(value.clone())
                } else {
                    Err(anyhow::anyhow!("attempt {retry} not yet {attempt}"))
                }
            }
            None => Ok(serde_json::Value::String(format!("{func} ==> ok"))),
        }
    }
}
