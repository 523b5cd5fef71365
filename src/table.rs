// src/table.rs

//! The shared, mutex-protected task table (§3 Ownership, §5 Shared state).
//!
//! A single reentrant mutex guards the map; tasks are value-copied in and
//! out so no reference ever escapes the lock. The mutex is reentrant so that
//! a caller already holding it (e.g. a worker mid-propagation) can still use
//! helpers that themselves take the lock without deadlocking.

use std::cell::RefCell;
use std::collections::HashMap;

use parking_lot::ReentrantMutex;

use crate::task::{Task, TaskId};

pub struct TaskTable {
    inner: ReentrantMutex<RefCell<HashMap<TaskId, Task>>>,
}

impl TaskTable {
    pub fn new() -> Self {
        TaskTable {
            inner: ReentrantMutex::new(RefCell::new(HashMap::new())),
        }
    }

    /// Insert a task, overwriting any existing task with the same id.
    pub fn insert(&self, task: Task) {
        let guard = self.inner.lock();
        guard.borrow_mut().insert(task.tid.clone(), task);
    }

    /// Read a single task out by id (value copy).
    pub fn get(&self, tid: &str) -> Option<Task> {
        let guard = self.inner.lock();
        guard.borrow().get(tid).cloned()
    }

    /// A value-copied snapshot of every task currently in the table.
    pub fn snapshot(&self) -> Vec<Task> {
        let guard = self.inner.lock();
        guard.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.lock();
        guard.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a closure with exclusive access to the underlying map, for
    /// compound read-modify-write sequences (readiness transitions,
    /// propagation) that must be observed atomically.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut HashMap<TaskId, Task>) -> R) -> R {
        let guard = self.inner.lock();
        f(&mut guard.borrow_mut())
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskInputs;

    #[test]
    fn insert_and_get_round_trip() {
        let table = TaskTable::new();
        table.insert(Task::new("t1", "f1", TaskInputs::new(), None));
        let t = table.get("t1").expect("task present");
        assert_eq!(t.tid, "t1");
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn insert_overwrites_existing_id() {
        let table = TaskTable::new();
        table.insert(Task::new("t1", "f1", TaskInputs::new(), None));
        table.insert(Task::new("t1", "f2", TaskInputs::new(), None));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("t1").unwrap().func, "f2");
    }

    #[test]
    fn with_lock_is_reentrant_via_nested_get() {
        let table = TaskTable::new();
        table.insert(Task::new("t1", "f1", TaskInputs::new(), None));
        table.with_lock(|tasks| {
            tasks.get_mut("t1").unwrap().func = "f3".to_string();
            // Re-entering the same mutex from within the closure must not
            // deadlock.
            assert_eq!(table.get("t1").unwrap().func, "f3");
        });
    }
}
