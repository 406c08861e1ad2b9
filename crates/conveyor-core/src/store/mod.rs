//! Durable job store port and in-memory implementation.

mod memory;

pub use memory::MemoryJobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ActionCode, HistoryRecord, JobError, JobId, JobRecord, JobStatus, Payload, Priority};

/// Fields written by a guarded status transition.
///
/// One parameterized operation instead of a per-call-site update, so every
/// transition goes through the same expected-status guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusUpdate {
    /// New -> Queued, recording the submission priority.
    Queued { priority: Priority },

    /// Queued -> Running, recording the start timestamp.
    Running { started_at: DateTime<Utc> },
}

/// Storage port (interface).
///
/// The store is the single source of truth for job status; the in-memory
/// implementation serves tests and demos, and this trait is the seam for a
/// SQL-backed implementation.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job record in `New` status and return its identifier.
    async fn insert(
        &self,
        action_code: ActionCode,
        payload: Payload,
        priority: Priority,
    ) -> Result<JobId, JobError>;

    /// Read a live record by identifier.
    async fn get(&self, job_id: JobId) -> Result<JobRecord, JobError>;

    /// Conditional status transition: apply `update` only if the stored
    /// record is still in `expected` status. Returns whether the guard
    /// matched; a `false` result means another caller already moved the job
    /// on, and the caller must treat this as a reported no-op.
    async fn transition(
        &self,
        job_id: JobId,
        expected: JobStatus,
        update: StatusUpdate,
    ) -> Result<bool, JobError>;

    /// Atomically move the live record into the append-only history with the
    /// given terminal status and finish timestamp. The live record is gone
    /// once this returns.
    async fn finish(
        &self,
        job_id: JobId,
        terminal: JobStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), JobError>;

    /// The archived records, oldest first.
    async fn history(&self) -> Result<Vec<HistoryRecord>, JobError>;
}
