//! In-memory job store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{JobStore, StatusUpdate};
use crate::domain::{
    ActionCode, HistoryRecord, JobError, JobId, JobRecord, JobStatus, Payload, Priority,
};

struct MemoryJobStoreState {
    /// Live records (single source of truth for status).
    live: HashMap<JobId, JobRecord>,

    /// Append-only audit trail, oldest first.
    history: Vec<HistoryRecord>,
}

/// In-memory store implementation.
///
/// The guarded transition and the live-to-history move are each performed
/// under one lock acquisition, which gives the same atomicity a SQL store
/// provides with a conditional `UPDATE` and a `DELETE ... OUTPUT INTO`.
pub struct MemoryJobStore {
    state: Mutex<MemoryJobStoreState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryJobStoreState {
                live: HashMap::new(),
                history: Vec::new(),
            }),
        }
    }

    /// Number of live (not yet archived) records.
    pub async fn live_len(&self) -> usize {
        self.state.lock().await.live.len()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(
        &self,
        action_code: ActionCode,
        payload: Payload,
        priority: Priority,
    ) -> Result<JobId, JobError> {
        let mut state = self.state.lock().await;
        let job_id = JobId::generate();
        let record = JobRecord::new(job_id, action_code, payload, priority, Utc::now());
        state.live.insert(job_id, record);
        Ok(job_id)
    }

    async fn get(&self, job_id: JobId) -> Result<JobRecord, JobError> {
        let state = self.state.lock().await;
        state
            .live
            .get(&job_id)
            .cloned()
            .ok_or_else(|| JobError::persistence(format!("job {job_id} not found")))
    }

    async fn transition(
        &self,
        job_id: JobId,
        expected: JobStatus,
        update: StatusUpdate,
    ) -> Result<bool, JobError> {
        let mut state = self.state.lock().await;
        let record = state
            .live
            .get_mut(&job_id)
            .ok_or_else(|| JobError::persistence(format!("job {job_id} not found")))?;

        if record.status != expected {
            return Ok(false);
        }
        match update {
            StatusUpdate::Queued { priority } => record.mark_queued(priority),
            StatusUpdate::Running { started_at } => record.mark_running(started_at),
        }
        Ok(true)
    }

    async fn finish(
        &self,
        job_id: JobId,
        terminal: JobStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), JobError> {
        if !terminal.is_terminal() {
            return Err(JobError::persistence(format!(
                "cannot archive job {job_id} with non-terminal status {terminal:?}"
            )));
        }

        let mut state = self.state.lock().await;
        let record = state
            .live
            .remove(&job_id)
            .ok_or_else(|| JobError::persistence(format!("job {job_id} not found")))?;
        state
            .history
            .push(HistoryRecord::from_live(record, terminal, finished_at));
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryRecord>, JobError> {
        let state = self.state.lock().await;
        Ok(state.history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn insert_one(store: &MemoryJobStore) -> JobId {
        store
            .insert(ActionCode::new("Greet"), Payload::new(), Priority::Normal)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryJobStore::new();
        let job_id = insert_one(&store).await;

        let record = store.get(job_id).await.unwrap();
        assert_eq!(record.job_id, job_id);
        assert_eq!(record.status, JobStatus::New);
        assert_eq!(record.action_code.as_str(), "Greet");
    }

    #[tokio::test]
    async fn get_missing_job_is_a_persistence_error() {
        let store = MemoryJobStore::new();
        let err = store.get(JobId::generate()).await.unwrap_err();
        assert!(matches!(err, JobError::Persistence(_)));
    }

    #[tokio::test]
    async fn transition_applies_only_when_guard_matches() {
        let store = MemoryJobStore::new();
        let job_id = insert_one(&store).await;

        let queued = store
            .transition(
                job_id,
                JobStatus::New,
                StatusUpdate::Queued {
                    priority: Priority::High,
                },
            )
            .await
            .unwrap();
        assert!(queued);

        // Second attempt sees Queued, not New.
        let again = store
            .transition(
                job_id,
                JobStatus::New,
                StatusUpdate::Queued {
                    priority: Priority::Low,
                },
            )
            .await
            .unwrap();
        assert!(!again);

        let record = store.get(job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.priority, Priority::High);
    }

    #[tokio::test]
    async fn concurrent_enqueue_wins_exactly_once() {
        let store = Arc::new(MemoryJobStore::new());
        let job_id = insert_one(&store).await;

        let mut joins = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            joins.push(tokio::spawn(async move {
                store
                    .transition(
                        job_id,
                        JobStatus::New,
                        StatusUpdate::Queued {
                            priority: Priority::Normal,
                        },
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut wins = 0;
        for join in joins {
            if join.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn finish_moves_record_into_history() {
        let store = MemoryJobStore::new();
        let job_id = insert_one(&store).await;

        store
            .transition(
                job_id,
                JobStatus::New,
                StatusUpdate::Queued {
                    priority: Priority::Normal,
                },
            )
            .await
            .unwrap();
        let started_at = Utc::now();
        store
            .transition(job_id, JobStatus::Queued, StatusUpdate::Running { started_at })
            .await
            .unwrap();

        store
            .finish(job_id, JobStatus::Completed, Utc::now())
            .await
            .unwrap();

        assert!(store.get(job_id).await.is_err());
        assert_eq!(store.live_len().await, 0);

        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, job_id);
        assert_eq!(history[0].status, JobStatus::Completed);
        assert!(history[0].started_at.unwrap() <= history[0].finished_at);
    }

    #[tokio::test]
    async fn finish_rejects_non_terminal_status() {
        let store = MemoryJobStore::new();
        let job_id = insert_one(&store).await;
        let err = store
            .finish(job_id, JobStatus::Running, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Persistence(_)));
        // Record is still live.
        assert!(store.get(job_id).await.is_ok());
    }

    #[tokio::test]
    async fn finish_missing_job_is_a_persistence_error() {
        let store = MemoryJobStore::new();
        let err = store
            .finish(JobId::generate(), JobStatus::Failed, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Persistence(_)));
    }
}
