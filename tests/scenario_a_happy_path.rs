use std::sync::Arc;

use taskgraph::{Executor, ManagerBuilder, TaskInputs, TaskState};
use taskgraph_test_utils::builders::TaskBuilder;

struct Echo;
impl Executor for Echo {
    fn call(
        &self,
        func: &str,
        _retry: u32,
        _inputs: &TaskInputs,
    ) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!(format!("{func} ==> msg")))
    }
}

#[test]
fn all_tasks_succeed_when_dag_resolves_cleanly() {
    // t1 depends on t2, t3, t4; t2 depends on t4.
    let tasks = vec![
        TaskBuilder::new("t1", "f1").after("t2").after("t3").after("t4").build(),
        TaskBuilder::new("t2", "f2").after("t4").build(),
        TaskBuilder::new("t3", "f3").build(),
        TaskBuilder::new("t4", "f4").build(),
    ];

    let manager = ManagerBuilder::new(Arc::new(Echo))
        .workers(4)
        .poll_interval(0)
        .tasks(tasks)
        .build()
        .expect("valid configuration");

    let summary = manager.start();

    assert_eq!(summary.exit_code, 0);
    assert_eq!(summary.results.success, 4);
    assert_eq!(summary.results.failures, 0);
    assert_eq!(summary.results.deps, 0);
    assert_eq!(summary.results.nrun, 0);
    assert_eq!(summary.results.aborted, 0);
    assert_eq!(summary.results.ready, 0);
    for task in &summary.tasks {
        assert_eq!(task.state, TaskState::Success);
    }
}
