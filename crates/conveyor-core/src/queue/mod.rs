//! Submission queue port and in-memory implementation.

mod memory;

pub use memory::InMemoryJobQueue;

use async_trait::async_trait;

use crate::domain::{JobError, JobId, Priority};

/// Submission queue port (interface).
///
/// The queue carries identifiers only; code and payload are rehydrated from
/// the store when a worker runs the job. The in-memory implementation serves
/// tests and demos, and this trait is the seam for an external broker.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Hand an identifier to the queue at the given priority.
    async fn enqueue(&self, job_id: JobId, priority: Priority) -> Result<(), JobError>;

    /// Take the next identifier, highest priority first (waits until one is
    /// available, or returns `None` once the queue is closed and drained).
    async fn dequeue(&self) -> Option<JobId>;

    /// Close the queue: pending identifiers are still dequeued, then every
    /// waiter receives `None`.
    async fn close(&self);
}
