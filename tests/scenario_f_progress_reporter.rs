use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use taskgraph::{Executor, ManagerBuilder, ProgressSink, TaskInputs};
use taskgraph_test_utils::builders::TaskBuilder;

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

#[derive(Default)]
struct RecordingSink {
    n: AtomicU64,
    total_delta: AtomicU64,
    closes: AtomicU64,
}

impl ProgressSink for RecordingSink {
    fn n(&self) -> u64 {
        self.n.load(Ordering::SeqCst)
    }

    fn update(&self, delta: u64) {
        self.total_delta.fetch_add(delta, Ordering::SeqCst);
        self.n.fetch_add(delta, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn cumulative_deltas_sum_to_total_tasks_and_close_fires_once() {
    let sink = Arc::new(RecordingSink::default());

    let tasks = vec![
        TaskBuilder::new("t1", "f1").after("t2").after("t3").after("t4").build(),
        TaskBuilder::new("t2", "f2").after("t4").build(),
        TaskBuilder::new("t3", "f3").build(),
        TaskBuilder::new("t4", "f4").build(),
        TaskBuilder::new("t5", "f5").after("t1").build(),
        TaskBuilder::new("t6", "f6").build(),
    ];

    let manager = ManagerBuilder::new(Arc::new(Echo))
        .workers(4)
        .poll_interval(0)
        .progress_sink(Arc::clone(&sink) as Arc<dyn ProgressSink>)
        .tasks(tasks)
        .build()
        .expect("valid configuration");

    let summary = manager.start();

    assert_eq!(summary.exit_code, 0);
    assert_eq!(sink.total_delta.load(Ordering::SeqCst), 6);
    assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn close_is_never_invoked_on_a_timed_out_run() {
    struct SleepsForever;
    impl Executor for SleepsForever {
        fn call(
            &self,
            _func: &str,
            _retry: u32,
            _inputs: &TaskInputs,
        ) -> anyhow::Result<serde_json::Value> {
            std::thread::sleep(std::time::Duration::from_secs(3600));
            Ok(serde_json::json!("unreachable"))
        }
    }

    let sink = Arc::new(RecordingSink::default());

    let manager = ManagerBuilder::new(Arc::new(SleepsForever))
        .workers(1)
        .deadline(0)
        .poll_interval(0)
        .progress_sink(Arc::clone(&sink) as Arc<dyn ProgressSink>)
        .task(TaskBuilder::new("t1", "slow").build())
        .build()
        .expect("valid configuration");

    let summary = manager.start();

    assert_eq!(summary.exit_code, 1);
    assert_eq!(sink.closes.load(Ordering::SeqCst), 0);
}
