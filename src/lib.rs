// src/lib.rs

//! A small, embeddable task-graph scheduler.
//!
//! Callers populate a [`manager::Manager`] with [`task::Task`]s declaring a
//! dependency DAG via `require`, supply an [`executor::Executor`] providing
//! the named operations those tasks invoke, and call
//! [`manager::Manager::start`] to run the graph to completion across a
//! worker pool, receiving a structured [`summary::RunSummary`] back.
//!
//! The scheduler itself never panics or returns an error to the caller for
//! a task's own failure — that is recorded as state on the task. Only
//! misconfiguration (via [`manager::ManagerBuilder`]) produces a
//! [`errors::SchedulerError`].

pub mod errors;
pub mod executor;
pub mod graph;
pub mod logging;
pub mod manager;
pub mod progress;
pub mod queue;
pub mod summary;
pub mod table;
pub mod task;
pub mod time;
pub mod worker;

pub use errors::SchedulerError;
pub use executor::Executor;
pub use graph::Graph;
pub use manager::{Manager, ManagerBuilder};
pub use progress::ProgressSink;
pub use queue::WorkQueue;
pub use summary::{ResultCounts, RunSummary};
pub use table::TaskTable;
pub use task::{Task, TaskId, TaskInputs, TaskState};
pub use worker::Worker;
