//! In-memory priority queue implementation.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use super::JobQueue;
use crate::domain::{JobError, JobId, Priority};

struct QueueState {
    /// One FIFO lane per priority level, indexed by `Priority::index`.
    lanes: [VecDeque<JobId>; Priority::COUNT],
    closed: bool,
}

impl QueueState {
    /// Pop from the highest non-empty lane.
    fn pop_highest(&mut self) -> Option<JobId> {
        for priority in Priority::ALL.into_iter().rev() {
            if let Some(job_id) = self.lanes[priority.index()].pop_front() {
                return Some(job_id);
            }
        }
        None
    }
}

/// In-memory queue implementation.
///
/// Strict priority order across lanes, FIFO within a lane. Waiters park on a
/// `Notify` rather than polling.
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                lanes: std::array::from_fn(|_| VecDeque::new()),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.lanes.iter().map(VecDeque::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job_id: JobId, priority: Priority) -> Result<(), JobError> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(JobError::persistence(format!(
                    "queue is closed, rejecting job {job_id}"
                )));
            }
            state.lanes[priority.index()].push_back(job_id);
        }
        // Notify outside the lock; a stored permit covers the race where no
        // worker is parked yet.
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Option<JobId> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            {
                let mut state = self.state.lock().await;
                if let Some(job_id) = state.pop_highest() {
                    return Some(job_id);
                }
                if state.closed {
                    return None;
                }
                // Register interest while still holding the lock, so a
                // close() or enqueue() between unlock and await cannot be
                // missed.
                notified.as_mut().enable();
            }
            notified.await;
        }
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }
}
