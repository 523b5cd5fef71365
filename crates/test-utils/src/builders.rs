#![allow(dead_code)]

use taskgraph::{Task, TaskInputs};

/// Builder for [`Task`] to simplify test setup.
pub struct TaskBuilder {
    tid: String,
    func: String,
    inputs: TaskInputs,
    require: Vec<String>,
}

impl TaskBuilder {
    pub fn new(tid: &str, func: &str) -> Self {
        TaskBuilder {
            tid: tid.to_string(),
            func: func.to_string(),
            inputs: TaskInputs::new(),
            require: Vec::new(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.require.push(dep.to_string());
        self
    }

    pub fn input(mut self, key: &str, value: serde_json::Value) -> Self {
        self.inputs.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Task {
        Task::new(self.tid, self.func, self.inputs, Some(self.require))
    }
}
