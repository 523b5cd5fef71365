// src/task.rs

//! The [`Task`] value object and its lifecycle state machine.
//!
//! A `Task` is value-copied in and out of the shared task table: callers get
//! an owned clone on read, mutate it locally, and write it back under the
//! table's lock. There are no long-lived references across the lock
//! boundary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time;

/// Unique task identifier. Opaque and non-empty within a single run.
pub type TaskId = String;

/// Named arguments passed verbatim to the executor's operation.
pub type TaskInputs = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state. Integer values are chosen so that `state < Init` means
/// "terminal failure" — see [`TaskState::is_terminal_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i8)]
pub enum TaskState {
    /// Declared dependencies were non-empty at execution time (bad graph / contract).
    Wrong = -3,
    /// A prerequisite reached a terminal failure; this task is poisoned.
    Dependency = -2,
    /// The operation raised on every retry.
    Error = -1,
    /// Freshly created, eligible once `require` is empty.
    Init = 0,
    /// Placed on the work queue; not yet picked up.
    Ready = 1,
    /// A worker is executing it.
    Running = 2,
    /// The operation returned normally.
    Success = 3,
}

impl TaskState {
    /// `state < Init`: the task reached a terminal *failure*.
    pub fn is_terminal_failure(self) -> bool {
        (self as i8) < 0
    }

    /// The task will never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Wrong | TaskState::Dependency | TaskState::Error | TaskState::Success
        )
    }

    /// Whether a task finishing in this state poisons its dependents as
    /// `Dependency`. Narrower than [`Self::is_terminal_failure`]: `Wrong` is
    /// a dependency-*contract* violation (the dispatcher enqueued a task it
    /// should never have), not a legitimate graph failure, and per the
    /// contract-violation scenario it does not cascade — dependents are left
    /// `Init`, same as if the offending task were still running.
    pub fn poisons_dependents(self) -> bool {
        matches!(self, TaskState::Error | TaskState::Dependency)
    }
}

/// A single unit of work: identity, inputs, target operation, prerequisites,
/// lifecycle state, result, and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub tid: TaskId,
    pub inputs: TaskInputs,
    pub func: String,
    pub require: Vec<TaskId>,
    pub state: TaskState,
    pub results: Option<serde_json::Value>,
    #[serde(serialize_with = "time::serialize_timestamp")]
    pub date_created: DateTime<Utc>,
    #[serde(serialize_with = "time::serialize_timestamp_opt")]
    pub date_start: Option<DateTime<Utc>>,
    #[serde(serialize_with = "time::serialize_timestamp_opt")]
    pub date_end: Option<DateTime<Utc>>,
    pub time_duration: Option<f64>,
    pub time_duration_str: Option<String>,
}

impl Task {
    /// Build a fresh task in `Init` state.
    ///
    /// A caller-supplied `require` that is absent or empty is normalised to
    /// an empty ordered sequence (the reference source's handling of this
    /// was inconsistent; this crate always normalises at construction).
    pub fn new(
        tid: impl Into<TaskId>,
        func: impl Into<String>,
        inputs: TaskInputs,
        require: Option<Vec<TaskId>>,
    ) -> Self {
        Task {
            tid: tid.into(),
            inputs,
            func: func.into(),
            require: require.unwrap_or_default(),
            state: TaskState::Init,
            results: None,
            date_created: time::now(),
            date_start: None,
            date_end: None,
            time_duration: None,
            time_duration_str: None,
        }
    }

    /// `state == Init && require.is_empty()`.
    pub fn is_runnable(&self) -> bool {
        self.state == TaskState::Init && self.require.is_empty()
    }

    /// `state ∉ {Init, Ready}`.
    pub fn is_finished(&self) -> bool {
        !matches!(self.state, TaskState::Init | TaskState::Ready)
    }

    /// Only the admissible transitions of the lifecycle state machine are
    /// accepted; anything else is a scheduler bug, not a caller error, so it
    /// panics rather than returning a `Result` (no caller-facing API calls
    /// this with untrusted input).
    ///
    /// `Init -> Running` is admitted alongside `Ready -> Running` because
    /// §4.3 step 2 sets a picked-up task's state to `Running` unconditionally,
    /// regardless of what it was before: a task forced onto the queue while
    /// still `Init` (the dependency-contract violation path, see
    /// `mark_wrong`) is picked up the same way a normally-dispatched `Ready`
    /// task is.
    pub fn transition(&mut self, to: TaskState) {
        let ok = matches!(
            (self.state, to),
            (TaskState::Init, TaskState::Ready)
                | (TaskState::Ready, TaskState::Running)
                | (TaskState::Init, TaskState::Running)
                | (TaskState::Running, TaskState::Success)
                | (TaskState::Running, TaskState::Error)
                | (TaskState::Running, TaskState::Wrong)
                | (TaskState::Init, TaskState::Dependency)
        );
        assert!(
            ok,
            "illegal task state transition for {:?}: {:?} -> {:?}",
            self.tid, self.state, to
        );
        self.state = to;
    }

    fn record_finish(&mut self, start: DateTime<Utc>) {
        let end = time::now();
        self.date_end = Some(end);
        let duration = (end - start)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();
        self.time_duration = Some(duration);
        self.time_duration_str = Some(crate::time::format_duration_hms(
            std::time::Duration::from_secs_f64(duration.max(0.0)),
        ));
    }

    /// Record that an attempt is starting; sets `date_start` on the first
    /// attempt only.
    pub fn mark_attempt_start(&mut self) {
        if self.date_start.is_none() {
            self.date_start = Some(time::now());
        }
    }

    /// Record a successful terminal outcome.
    pub fn mark_success(&mut self, value: serde_json::Value) {
        let start = self.date_start.unwrap_or_else(time::now);
        self.results = Some(value);
        self.transition(TaskState::Success);
        self.record_finish(start);
    }

    /// Record a failed attempt; `results` holds the rendered error. Does not
    /// transition state by itself since the worker may still have retries
    /// left — callers transition to `Error` once retries are exhausted.
    pub fn mark_attempt_failed(&mut self, rendered_error: String) {
        self.results = Some(serde_json::Value::String(rendered_error));
        let start = self.date_start.unwrap_or_else(time::now);
        self.record_finish(start);
    }

    /// Record final exhaustion of retries.
    pub fn mark_error(&mut self) {
        self.transition(TaskState::Error);
    }

    /// Record a dependency-contract violation (`require` non-empty at run).
    pub fn mark_wrong(&mut self, rendered_error: String) {
        let start = self.date_start.unwrap_or_else(time::now);
        self.results = Some(serde_json::Value::String(rendered_error));
        self.transition(TaskState::Wrong);
        self.record_finish(start);
    }
}

/// Propagate the terminal outcome of `finished_tid` to its dependents,
/// mutating `tasks` in place and returning the ids of every task whose state
/// or `require` list changed (for logging).
///
/// Mirrors the reference `update_childs`: for every other task `C` still in
/// `Init` whose `require` names `finished_tid`, either drop the now-satisfied
/// prerequisite (on success) or poison `C` as `Dependency` and recurse as if
/// `C` itself had just failed (on terminal failure), so a whole subtree is
/// poisoned in one pass. `Wrong` is a dependency-*contract* violation, not a
/// legitimate graph failure (see [`TaskState::poisons_dependents`]): it is a
/// no-op here, same as a prerequisite still `Running` — dependents are left
/// untouched in `Init`. Implemented iteratively with an explicit stack to
/// avoid unbounded recursion depth on long dependency chains.
pub fn propagate_to_dependents(
    tasks: &mut HashMap<TaskId, Task>,
    finished_tid: &TaskId,
) -> Vec<TaskId> {
    let mut changed = Vec::new();
    let mut stack = vec![finished_tid.clone()];

    while let Some(tid) = stack.pop() {
        let finished_state = match tasks.get(&tid) {
            Some(t) => t.state,
            None => continue,
        };

        let poisons = finished_state.poisons_dependents();
        if finished_state != TaskState::Success && !poisons {
            // Still running, or a non-poisoning terminal state (`Wrong`);
            // nothing to propagate.
            continue;
        }

        let dependent_ids: Vec<TaskId> = tasks
            .iter()
            .filter(|(_, t)| t.state == TaskState::Init && t.require.contains(&tid))
            .map(|(id, _)| id.clone())
            .collect();

        for dep_id in dependent_ids {
            let child = match tasks.get_mut(&dep_id) {
                Some(c) => c,
                None => continue,
            };
            child.require.retain(|r| r != &tid);
            if poisons {
                child.transition(TaskState::Dependency);
                changed.push(dep_id.clone());
                stack.push(dep_id);
            } else {
                changed.push(dep_id);
            }
        }
    }

    changed
}
