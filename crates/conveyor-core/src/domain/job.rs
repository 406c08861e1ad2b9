//! Job records and status management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ActionCode;
use super::envelope::Payload;
use super::ids::JobId;
use super::priority::Priority;

/// Status of a durable job.
///
/// Transitions, terminal states marked `*`:
/// - New -> Queued -> Running -> Completed`*`
/// - Running -> Failed`*`
/// - Running -> Cancelled`*`
///
/// The store is the single source of truth for status; every transition goes
/// through a guarded conditional update, so no reader can observe the sequence
/// out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    New,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// A live job record.
///
/// Created in `New` when an envelope is persisted; mutated only through the
/// transition methods below (never by direct field access), and removed from
/// the live table when it is archived into a [`HistoryRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub action_code: ActionCode,

    /// Payload snapshot taken at submission (defaults already merged in).
    #[serde(rename = "more")]
    pub payload: Payload,

    pub priority: Priority,
    pub status: JobStatus,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(
        job_id: JobId,
        action_code: ActionCode,
        payload: Payload,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            action_code,
            payload,
            priority,
            status: JobStatus::New,
            created_at,
            started_at: None,
        }
    }

    /// New -> Queued, recording the submission priority.
    pub fn mark_queued(&mut self, priority: Priority) {
        self.status = JobStatus::Queued;
        self.priority = priority;
    }

    /// Queued -> Running, recording the start timestamp.
    pub fn mark_running(&mut self, started_at: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.started_at = Some(started_at);
    }
}

/// Append-only audit trace of a finished job.
///
/// Carries the live record's fields plus the terminal status and finish
/// timestamp; the atomic move from the live table to history is the job's
/// "destroy" and this record's "create".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub job_id: JobId,
    pub action_code: ActionCode,

    #[serde(rename = "more")]
    pub payload: Payload,

    pub priority: Priority,
    pub status: JobStatus,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn from_live(record: JobRecord, terminal: JobStatus, finished_at: DateTime<Utc>) -> Self {
        Self {
            job_id: record.job_id,
            action_code: record.action_code,
            payload: record.payload,
            priority: record.priority,
            status: terminal,
            created_at: record.created_at,
            started_at: record.started_at,
            finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> JobRecord {
        JobRecord::new(
            JobId::generate(),
            ActionCode::new("Greet"),
            Payload::new(),
            Priority::Normal,
            Utc::now(),
        )
    }

    #[test]
    fn new_record_starts_as_new() {
        let job = record();
        assert_eq!(job.status, JobStatus::New);
        assert!(job.started_at.is_none());
    }

    #[test]
    fn transitions_record_priority_and_start_time() {
        let mut job = record();
        job.mark_queued(Priority::High);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.priority, Priority::High);

        let started = Utc::now();
        job.mark_running(started);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.started_at, Some(started));
    }

    #[rstest]
    #[case::new(JobStatus::New, false)]
    #[case::queued(JobStatus::Queued, false)]
    #[case::running(JobStatus::Running, false)]
    #[case::completed(JobStatus::Completed, true)]
    #[case::failed(JobStatus::Failed, true)]
    #[case::cancelled(JobStatus::Cancelled, true)]
    fn terminal_states(#[case] status: JobStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn archive_keeps_live_fields() {
        let mut job = record();
        job.mark_queued(Priority::High);
        let started = Utc::now();
        job.mark_running(started);

        let finished = Utc::now();
        let archived = HistoryRecord::from_live(job.clone(), JobStatus::Completed, finished);
        assert_eq!(archived.job_id, job.job_id);
        assert_eq!(archived.priority, Priority::High);
        assert_eq!(archived.status, JobStatus::Completed);
        assert_eq!(archived.started_at, Some(started));
        assert_eq!(archived.finished_at, finished);
    }
}
