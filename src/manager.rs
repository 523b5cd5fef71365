// src/manager.rs

//! The dispatcher (§4.4): owns the run, spawns workers, iteratively
//! recomputes the readiness frontier, enforces the deadline, drains, and
//! produces the summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;

use crate::errors::SchedulerError;
use crate::executor::Executor;
use crate::graph::Graph;
use crate::progress::ProgressSink;
use crate::queue::WorkQueue;
use crate::summary::RunSummary;
use crate::table::TaskTable;
use crate::task::Task;
use crate::time::{format_duration_hms, format_timestamp, now};
use crate::worker::Worker;

const DEFAULT_DEADLINE_SECS: u64 = 3600;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_MAX_RETRY: u32 = 3;

/// How long [`Manager::start`] waits for a worker thread to notice a
/// forceful shutdown before giving up on it. A stuck executor call cannot be
/// interrupted (§5 Cancellation); this bounds total wall-clock time rather
/// than guaranteeing every worker actually stops.
fn shutdown_slack(poll_interval: Duration) -> Duration {
    (poll_interval * 2).max(Duration::from_millis(500))
}

/// Fluent, validating builder for [`Manager`] — this library's configuration
/// surface (there is no file format; see SPEC §6 Configuration).
pub struct ManagerBuilder {
    executor: Arc<dyn Executor>,
    worker_count: Option<usize>,
    deadline: Duration,
    poll_interval: Duration,
    max_retry: u32,
    progress: Option<Arc<dyn ProgressSink>>,
    tasks: Vec<Task>,
}

impl ManagerBuilder {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        ManagerBuilder {
            executor,
            worker_count: None,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_retry: DEFAULT_MAX_RETRY,
            progress: None,
            tasks: Vec::new(),
        }
    }

    /// Defaults to the host's logical CPU count.
    pub fn workers(mut self, n: usize) -> Self {
        self.worker_count = Some(n);
        self
    }

    pub fn deadline(mut self, secs: u64) -> Self {
        self.deadline = Duration::from_secs(secs);
        self
    }

    pub fn poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval = Duration::from_secs(secs);
        self
    }

    pub fn max_retry(mut self, n: u32) -> Self {
        self.max_retry = n;
        self
    }

    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn build(self) -> Result<Manager, SchedulerError> {
        if let Some(0) = self.worker_count {
            return Err(SchedulerError::Config(
                "worker count must be at least 1".into(),
            ));
        }
        if self.max_retry == 0 {
            return Err(SchedulerError::Config("max_retry must be at least 1".into()));
        }

        let table = Arc::new(TaskTable::new());
        for task in self.tasks {
            table.insert(task);
        }

        Ok(Manager {
            executor: self.executor,
            worker_count: self.worker_count.unwrap_or_else(num_cpus::get),
            deadline: self.deadline,
            poll_interval: self.poll_interval,
            max_retry: self.max_retry,
            progress: self.progress,
            table,
            queue: Arc::new(WorkQueue::new()),
        })
    }
}

pub struct Manager {
    executor: Arc<dyn Executor>,
    worker_count: usize,
    deadline: Duration,
    poll_interval: Duration,
    max_retry: u32,
    progress: Option<Arc<dyn ProgressSink>>,
    table: Arc<TaskTable>,
    queue: Arc<WorkQueue>,
}

impl Manager {
    /// Insert a task into the shared table, keyed by `task.tid`. Inserting
    /// an id already present overwrites.
    pub fn add(&self, task: Task) {
        self.table.insert(task);
    }

    /// Run the scheduler to completion (or until the deadline fires) and
    /// return the structured summary. Never returns an error to the caller
    /// (§7): dispatcher-level failures surface as fields on the summary.
    pub fn start(&self) -> RunSummary {
        let t_start = Instant::now();
        let date_start = now();

        tracing::info!(
            workers = self.worker_count,
            deadline_secs = self.deadline.as_secs(),
            max_retry = self.max_retry,
            "run starting"
        );

        let handles: Vec<_> = (0..self.worker_count)
            .map(|i| {
                let worker = Worker::new(
                    format!("worker-{i}"),
                    Arc::clone(&self.executor),
                    Arc::clone(&self.queue),
                    Arc::clone(&self.table),
                    self.max_retry,
                );
                thread::spawn(move || worker.run())
            })
            .collect();

        let deadline_at = t_start + self.deadline;
        let progress_n = AtomicU64::new(self.progress.as_ref().map(|p| p.n()).unwrap_or(0));

        let mut graph = Graph::from_tasks(&self.table.snapshot());
        let mut edges = graph.edges();
        let mut timed_out = false;

        while !edges.is_empty() {
            if Instant::now() >= deadline_at {
                timed_out = true;
                break;
            }

            let isolated = graph.isolated_vertices();
            self.table.with_lock(|tasks| {
                for tid in &isolated {
                    if let Some(task) = tasks.get_mut(tid) {
                        if task.is_runnable() {
                            task.transition(crate::task::TaskState::Ready);
                            self.queue.put(tid.clone());
                        }
                    }
                }
            });

            let snapshot = self.table.snapshot();
            graph = Graph::from_tasks(&snapshot);
            edges = graph.edges();

            self.report_progress(&snapshot, &progress_n);

            tracing::debug!(edges_remaining = edges.len(), "poll tick");
            thread::sleep(self.poll_interval);
        }

        if timed_out {
            tracing::error!(
                deadline_secs = self.deadline.as_secs(),
                "run exceeded its deadline"
            );
            self.queue.close();
        } else {
            for _ in 0..self.worker_count {
                self.queue.put_sentinel();
            }
            self.queue.join();

            let snapshot = self.table.snapshot();
            self.report_progress(&snapshot, &progress_n);
            if let Some(sink) = &self.progress {
                sink.close();
            }
        }

        // §4.4 step 6: in all exit paths, forcibly stop then join every
        // worker. After a cooperative drain every thread has already exited
        // via the sentinel, so this is a fast reap; on the timeout path it
        // is best-effort (see `shutdown_slack`).
        let slack = shutdown_slack(self.poll_interval);
        for handle in handles {
            join_with_timeout(handle, slack);
        }

        let date_end = now();
        let elapsed = format_duration_hms(t_start.elapsed());
        let tasks = self.table.snapshot();

        tracing::info!(
            elapsed = %elapsed,
            timed_out,
            total_tasks = tasks.len(),
            "run finished"
        );

        RunSummary::build(
            format_timestamp(date_start),
            format_timestamp(date_end),
            elapsed,
            tasks,
        )
    }

    fn report_progress(&self, snapshot: &[Task], progress_n: &AtomicU64) {
        let Some(sink) = &self.progress else {
            return;
        };
        let finished = snapshot.iter().filter(|t| t.is_finished()).count() as u64;
        let prior = progress_n.load(Ordering::SeqCst);
        let delta = finished.saturating_sub(prior);
        if delta > 0 {
            sink.update(delta);
            progress_n.store(prior + delta, Ordering::SeqCst);
        }
    }
}

/// Join a worker thread, giving up after `timeout` rather than blocking
/// forever on a thread wedged inside an uninterruptible executor call.
fn join_with_timeout(handle: thread::JoinHandle<()>, timeout: Duration) {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let _ = handle.join();
        let _ = tx.send(());
    });
    let _ = rx.recv_timeout(timeout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskInputs;

    struct Echo;
    impl Executor for Echo {
        fn call(
            &self,
            func: &str,
            _retry: u32,
            _inputs: &TaskInputs,
        ) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!(format!("{func} ==> ok")))
        }
    }

    #[test]
    fn zero_workers_is_rejected_at_build_time() {
        let err = ManagerBuilder::new(Arc::new(Echo))
            .workers(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Config(_)));
    }

    #[test]
    fn happy_path_all_tasks_succeed() {
        let manager = ManagerBuilder::new(Arc::new(Echo))
            .workers(2)
            .poll_interval(0)
            .task(Task::new("t1", "f1", TaskInputs::new(), None))
            .task(Task::new(
                "t2",
                "f2",
                TaskInputs::new(),
                Some(vec!["t1".to_string()]),
            ))
            .build()
            .unwrap();

        let summary = manager.start();
        assert_eq!(summary.exit_code, 0);
        assert_eq!(summary.results.success, 2);
    }
}
