// src/summary.rs

//! The machine-readable result summary returned by [`crate::manager::Manager::start`] (§4.4, §6).

use serde::Serialize;

use crate::task::{Task, TaskState};

/// Counts of tasks grouped by final state.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ResultCounts {
    pub success: u64,
    pub failures: u64,
    pub deps: u64,
    pub nrun: u64,
    pub aborted: u64,
    pub ready: u64,
}

impl ResultCounts {
    pub fn tally(tasks: &[Task]) -> Self {
        let mut counts = ResultCounts::default();
        for task in tasks {
            match task.state {
                TaskState::Success => counts.success += 1,
                TaskState::Error => counts.failures += 1,
                TaskState::Dependency => counts.deps += 1,
                TaskState::Init => counts.nrun += 1,
                TaskState::Running => counts.aborted += 1,
                TaskState::Ready => counts.ready += 1,
                TaskState::Wrong => counts.failures += 1,
            }
        }
        counts
    }
}

/// Structured summary of a completed (or timed-out) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date_start: String,
    pub date_end: String,
    pub elapsed: String,
    pub tasks: Vec<Task>,
    pub results: ResultCounts,
    pub exit_code: i32,
}

impl RunSummary {
    pub fn build(date_start: String, date_end: String, elapsed: String, tasks: Vec<Task>) -> Self {
        let results = ResultCounts::tally(&tasks);
        let total = tasks.len() as u64;
        let exit_code = if results.success == total { 0 } else { 1 };
        RunSummary {
            date_start,
            date_end,
            elapsed,
            tasks,
            results,
            exit_code,
        }
    }
}
