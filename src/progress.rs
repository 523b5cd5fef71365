// src/progress.rs

//! Optional progress reporting sink (§6).

/// An object a caller attaches to observe coarse run progress.
///
/// `n` reports the count already acknowledged by the sink; `update` is
/// called with a positive delta of newly-finished tasks (where "finished"
/// intentionally includes `Running`, so long-lived tasks visibly advance the
/// moment they start — see §3, §6); `close` is called once at normal end of
/// run, and never on a timed-out run.
pub trait ProgressSink: Send + Sync {
    fn n(&self) -> u64;
    fn update(&self, delta: u64);
    fn close(&self);
}
