// src/worker.rs

//! The worker loop (§4.3): pulls task ids, runs the operation with bounded
//! retries, writes results back, and cascades propagation to dependents —
//! all under the shared table's mutex.

use std::sync::Arc;

use crate::executor::Executor;
use crate::queue::{QueueItem, WorkQueue};
use crate::table::TaskTable;
use crate::task::{propagate_to_dependents, TaskState};

pub struct Worker {
    name: String,
    executor: Arc<dyn Executor>,
    queue: Arc<WorkQueue>,
    table: Arc<TaskTable>,
    max_retry: u32,
}

impl Worker {
    pub fn new(
        name: String,
        executor: Arc<dyn Executor>,
        queue: Arc<WorkQueue>,
        table: Arc<TaskTable>,
        max_retry: u32,
    ) -> Self {
        Worker {
            name,
            executor,
            queue,
            table,
            max_retry,
        }
    }

    /// Run until the sentinel, a forceful close, or the channel disconnects.
    pub fn run(&self) {
        tracing::debug!(worker = %self.name, "worker starting");
        loop {
            match self.queue.get() {
                QueueItem::Sentinel => {
                    tracing::debug!(worker = %self.name, "sentinel received, exiting");
                    self.queue.task_done();
                    break;
                }
                QueueItem::Closed => {
                    tracing::debug!(worker = %self.name, "queue closed, exiting");
                    break;
                }
                QueueItem::Task(tid) => {
                    self.run_one(&tid);
                    self.queue.task_done();
                }
            }
        }
        tracing::debug!(worker = %self.name, "worker stopped");
    }

    fn run_one(&self, tid: &str) {
        let Some(mut task) = self.table.get(tid) else {
            tracing::warn!(worker = %self.name, tid, "task vanished before pickup");
            return;
        };

        task.transition(TaskState::Running);
        self.table.insert(task.clone());

        let span = tracing::debug_span!("task", worker = %self.name, tid = %task.tid, func = %task.func);
        let _guard = span.enter();

        if !task.require.is_empty() {
            let rendered = format!(
                "dependency contract violated: require non-empty at execution time: {:?}",
                task.require
            );
            tracing::error!(tid = %task.tid, "{rendered}");
            task.mark_wrong(rendered);
        } else {
            for retry in 1..=self.max_retry {
                task.mark_attempt_start();
                tracing::debug!(tid = %task.tid, retry, "invoking operation");
                match self.executor.call(&task.func, retry, &task.inputs) {
                    Ok(value) => {
                        tracing::info!(tid = %task.tid, retry, "task succeeded");
                        task.mark_success(value);
                        break;
                    }
                    Err(err) => {
                        let rendered = format!("{err:#}");
                        if retry == self.max_retry {
                            tracing::error!(tid = %task.tid, retry, error = %rendered, "task failed, retries exhausted");
                        } else {
                            tracing::warn!(tid = %task.tid, retry, error = %rendered, "attempt failed, retrying");
                        }
                        task.mark_attempt_failed(rendered);
                    }
                }
            }
            if task.state != TaskState::Success {
                task.mark_error();
            }
        }

        drop(_guard);

        self.table.with_lock(|tasks| {
            tasks.insert(task.tid.clone(), task.clone());
            let changed = propagate_to_dependents(tasks, &task.tid);
            if !changed.is_empty() {
                tracing::debug!(tid = %task.tid, ?changed, "propagated terminal state to dependents");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskInputs};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct AlwaysSucceeds;
    impl Executor for AlwaysSucceeds {
        fn call(
            &self,
            _func: &str,
            _retry: u32,
            _inputs: &TaskInputs,
        ) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!("ok"))
        }
    }

    struct AlwaysFails {
        calls: AtomicU32,
    }
    impl Executor for AlwaysFails {
        fn call(
            &self,
            _func: &str,
            _retry: u32,
            _inputs: &TaskInputs,
        ) -> anyhow::Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("boom"))
        }
    }

    fn queue_with_one(tid: &str) -> Arc<WorkQueue> {
        let queue = Arc::new(WorkQueue::new());
        queue.put(tid.to_string());
        queue
    }

    #[test]
    fn successful_task_reaches_success_and_propagates() {
        let table = Arc::new(TaskTable::new());
        table.insert(Task::new("p", "f", TaskInputs::new(), None));
        table.insert(Task::new(
            "c",
            "f",
            TaskInputs::new(),
            Some(vec!["p".to_string()]),
        ));

        let worker = Worker::new(
            "w0".into(),
            Arc::new(AlwaysSucceeds),
            queue_with_one("p"),
            Arc::clone(&table),
            3,
        );
        worker.run_one("p");

        let p = table.get("p").unwrap();
        assert_eq!(p.state, TaskState::Success);
        let c = table.get("c").unwrap();
        assert!(c.require.is_empty());
        assert!(c.is_runnable());
    }

    #[test]
    fn failing_task_retries_exactly_max_retry_times() {
        let table = Arc::new(TaskTable::new());
        table.insert(Task::new("t", "f", TaskInputs::new(), None));
        let executor = Arc::new(AlwaysFails {
            calls: AtomicU32::new(0),
        });

        let worker = Worker::new(
            "w0".into(),
            Arc::clone(&executor) as Arc<dyn Executor>,
            queue_with_one("t"),
            Arc::clone(&table),
            3,
        );
        worker.run_one("t");

        assert_eq!(executor.calls.load(Ordering::SeqCst), 3);
        let t = table.get("t").unwrap();
        assert_eq!(t.state, TaskState::Error);
        assert!(t.results.is_some());
    }

    #[test]
    fn task_with_nonempty_require_becomes_wrong() {
        let table = Arc::new(TaskTable::new());
        table.insert(Task::new(
            "t",
            "f",
            TaskInputs::new(),
            Some(vec!["missing".to_string()]),
        ));
        let worker = Worker::new(
            "w0".into(),
            Arc::new(AlwaysSucceeds),
            queue_with_one("t"),
            Arc::clone(&table),
            3,
        );
        worker.run_one("t");

        let t = table.get("t").unwrap();
        assert_eq!(t.state, TaskState::Wrong);
    }
}
