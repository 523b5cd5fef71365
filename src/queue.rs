// src/queue.rs

//! FIFO work queue between the dispatcher and workers, with a sentinel for
//! cooperative shutdown and a join barrier equivalent to
//! `multiprocessing.Queue.join()` / `task_done()` (§4.3, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};

use crate::task::TaskId;

/// An item pulled off the queue by a worker.
pub enum QueueItem {
    Task(TaskId),
    /// The distinguished null-tid sentinel: exit the worker loop cleanly.
    Sentinel,
    /// The queue was closed out from under a blocked `get` (forceful
    /// shutdown path, see [`WorkQueue::close`]).
    Closed,
}

/// How long a blocked `get` waits before re-checking whether the queue has
/// been closed. Bounds how quickly a forceful shutdown can wake idle
/// workers; it does not bound how long an in-progress executor call runs.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct WorkQueue {
    sender: Sender<Option<TaskId>>,
    receiver: Receiver<Option<TaskId>>,
    pending: Mutex<u64>,
    pending_cv: Condvar,
    closed: AtomicBool,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        WorkQueue {
            sender,
            receiver,
            pending: Mutex::new(0),
            pending_cv: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a task id. Every `put` must be matched by exactly one
    /// `task_done` call.
    pub fn put(&self, tid: TaskId) {
        *self.pending.lock() += 1;
        // A closed/disconnected receiver only happens after every worker has
        // exited, at which point no one is left to care about this send.
        let _ = self.sender.send(Some(tid));
    }

    /// Enqueue one sentinel, consumed by exactly one worker.
    pub fn put_sentinel(&self) {
        *self.pending.lock() += 1;
        let _ = self.sender.send(None);
    }

    /// Pull the next item, waking periodically to notice [`Self::close`].
    pub fn get(&self) -> QueueItem {
        loop {
            match self.receiver.recv_timeout(CLOSE_POLL_INTERVAL) {
                Ok(Some(tid)) => return QueueItem::Task(tid),
                Ok(None) => return QueueItem::Sentinel,
                Err(RecvTimeoutError::Disconnected) => return QueueItem::Closed,
                Err(RecvTimeoutError::Timeout) => {
                    if self.closed.load(Ordering::Acquire) {
                        return QueueItem::Closed;
                    }
                }
            }
        }
    }

    /// Acknowledge one item as fully processed (including sentinels and
    /// error paths). Wakes up [`Self::join`] once every put has been
    /// acknowledged.
    pub fn task_done(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.pending_cv.notify_all();
        }
    }

    /// Block until every item ever `put` has been acknowledged.
    pub fn join(&self) {
        let mut pending = self.pending.lock();
        while *pending != 0 {
            self.pending_cv.wait(&mut pending);
        }
    }

    /// Forceful shutdown signal: wakes any worker blocked in `get` within
    /// [`CLOSE_POLL_INTERVAL`], causing it to exit its loop. Does not affect
    /// an executor call already in progress.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
