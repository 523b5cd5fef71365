// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! A task's own operation failure is never surfaced through this type — it is
//! recorded as data on the [`crate::task::Task`] itself (`state = ERROR`,
//! `results` holding the rendered failure). A run timeout is likewise never
//! raised to the caller: per §7, "the run itself never raises to its caller;
//! callers inspect the summary" — a timed-out run is reported via
//! `RunSummary::exit_code` and the per-task states, not an `Err`.
//! `SchedulerError` is reserved for the one thing this crate *does* fail on
//! synchronously: invalid [`crate::manager::ManagerBuilder`] configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid scheduler configuration: {0}")]
    Config(String),
}
