//! Job lifecycle manager.
//!
//! Orchestrates the whole path of a job: compact an envelope, persist it,
//! enqueue the identifier, and, when a worker calls [`JobProcessor::run`],
//! expand, execute the handler, record the terminal outcome and chain any
//! follow-up job the payload declares.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::action::{Action, ActionFactory};
use crate::domain::route::{JOB_ID_FIELD, PRIORITY_FIELD, SUCCESS_FIELD, carried_priority};
use crate::domain::{
    ActionCode, JobEnvelope, JobError, JobId, JobStatus, Payload, Priority, merge_defaults,
};
use crate::queue::JobQueue;
use crate::registry::ActionRegistry;
use crate::store::{JobStore, StatusUpdate};

/// The lifecycle manager.
///
/// Owns job-status transitions exclusively; handlers only ever see the merged
/// payload. Safe to drive concurrently for distinct job ids: the only shared
/// mutable state is the store and the registry, which serialize themselves.
pub struct JobProcessor {
    registry: Arc<ActionRegistry>,
    factory: Arc<dyn ActionFactory>,
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
}

impl JobProcessor {
    pub fn new(
        registry: Arc<ActionRegistry>,
        factory: Arc<dyn ActionFactory>,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            registry,
            factory,
            store,
            queue,
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Compact `(code, payload)` into the transportable envelope text.
    ///
    /// Fails with [`JobError::UnknownActionCode`] when the code is not
    /// registered; the caller's payload wins key conflicts against the
    /// registered defaults.
    pub async fn compact(
        &self,
        code: &ActionCode,
        payload: Option<Payload>,
    ) -> Result<String, JobError> {
        let envelope = self.compacted(code, payload).await?;
        Ok(envelope.encode())
    }

    /// Expand envelope text, or a job reference produced by [`submit`], back
    /// into `(implementation id, merged payload)`.
    ///
    /// A job reference is rehydrated from the store, and the payload gains a
    /// `"__job_id"` control field so handlers can correlate. The payload is
    /// merged over the currently registered defaults, which keeps the
    /// round-trip law and also accepts hand-authored envelopes that carry
    /// overrides only.
    ///
    /// [`submit`]: JobProcessor::submit
    pub async fn expand(&self, job_ref: &str) -> Result<(String, Payload), JobError> {
        let (envelope, job_id) = match job_ref.parse::<JobId>() {
            Ok(job_id) => {
                let record = self.store.get(job_id).await?;
                (
                    JobEnvelope::new(record.action_code, record.payload),
                    Some(job_id),
                )
            }
            Err(_) => (JobEnvelope::decode(job_ref)?, None),
        };

        let item = self.registry.get(&envelope.code).await?;
        let mut payload = merge_defaults(&item.defaults, envelope.payload);
        if let Some(job_id) = job_id {
            payload.insert(JOB_ID_FIELD.to_string(), Value::String(job_id.to_string()));
        }
        Ok((item.impl_id, payload))
    }

    /// Compact and persist a `New` job record; returns the durable id.
    ///
    /// A store rejection surfaces as [`JobError::Persistence`]; the job is
    /// never silently dropped.
    pub async fn submit(
        &self,
        code: &ActionCode,
        payload: Option<Payload>,
    ) -> Result<JobId, JobError> {
        let envelope = self.compacted(code, payload).await?;
        let job_id = self
            .store
            .insert(envelope.code, envelope.payload, Priority::default())
            .await?;
        info!(%job_id, %code, "job compacted");
        Ok(job_id)
    }

    /// Guarded `New -> Queued` transition, then hand the id to the queue.
    ///
    /// Returns `false` (a reported no-op, not an error) when the record has
    /// already left `New`; the guard is what makes a concurrent double
    /// enqueue execute the job exactly once.
    pub async fn enqueue(&self, job_id: JobId, priority: Priority) -> Result<bool, JobError> {
        let queued = self
            .store
            .transition(job_id, JobStatus::New, StatusUpdate::Queued { priority })
            .await?;
        if !queued {
            warn!(%job_id, "enqueue skipped: job already left New");
            return Ok(false);
        }

        self.queue.enqueue(job_id, priority).await?;
        info!(%job_id, %priority, "job queued");
        Ok(true)
    }

    /// Execute a dequeued job: expand, transition `Queued -> Running`, invoke
    /// the handler, record the terminal outcome, then chain.
    ///
    /// The outcome classification:
    /// - `Ok` from the handler archives `Completed` and chains the success
    ///   branch; a chaining failure there surfaces to the caller.
    /// - [`JobError::Cancelled`] archives `Cancelled`, never chains, and is
    ///   rethrown.
    /// - Any other handler error archives `Failed`, chains the failure
    ///   branch, then rethrows the original fault; a chaining failure is
    ///   logged rather than allowed to mask it.
    ///
    /// Archive failures are swallowed and logged; they never overwrite the
    /// primary outcome.
    pub async fn run(&self, job_id: JobId, cancel: &CancellationToken) -> Result<(), JobError> {
        let record = self.store.get(job_id).await?;
        let item = self.registry.get(&record.action_code).await?;
        let action = self.factory.create(&item.impl_id)?;

        let mut payload = merge_defaults(&item.defaults, record.payload);
        payload.insert(JOB_ID_FIELD.to_string(), Value::String(job_id.to_string()));
        payload.insert(
            PRIORITY_FIELD.to_string(),
            Value::String(record.priority.to_string()),
        );

        let started_at = Utc::now();
        let running = self
            .store
            .transition(job_id, JobStatus::Queued, StatusUpdate::Running { started_at })
            .await?;
        if !running {
            warn!(%job_id, "run skipped: job is not Queued");
            return Ok(());
        }
        info!(%job_id, action = %item.impl_id, "job running");

        match action.exec(&payload, cancel).await {
            Ok(()) => {
                self.finish(job_id, JobStatus::Completed).await;
                info!(%job_id, "job completed");
                self.chain(job_id, action.as_ref(), payload, true).await?;
                Ok(())
            }
            Err(JobError::Cancelled) => {
                self.finish(job_id, JobStatus::Cancelled).await;
                info!(%job_id, "job cancelled");
                Err(JobError::Cancelled)
            }
            Err(fault) => {
                self.finish(job_id, JobStatus::Failed).await;
                error!(%job_id, error = %fault, "job failed");
                if let Err(chain_error) = self.chain(job_id, action.as_ref(), payload, false).await
                {
                    warn!(%job_id, error = %chain_error, "failure-branch chain not submitted");
                }
                Err(fault)
            }
        }
    }

    async fn compacted(
        &self,
        code: &ActionCode,
        payload: Option<Payload>,
    ) -> Result<JobEnvelope, JobError> {
        let item = self.registry.get(code).await?;
        let merged = merge_defaults(&item.defaults, payload.unwrap_or_default());
        Ok(JobEnvelope::new(code.clone(), merged))
    }

    /// Archive a terminal outcome, swallowing secondary failures.
    async fn finish(&self, job_id: JobId, terminal: JobStatus) {
        if let Err(error) = self.store.finish(job_id, terminal, Utc::now()).await {
            warn!(%job_id, %error, "archiving terminal job failed");
        }
    }

    /// Ask the handler's chaining hook for a follow-up and submit it.
    ///
    /// Runs strictly after the triggering job's terminal state is recorded.
    async fn chain(
        &self,
        job_id: JobId,
        action: &dyn Action,
        mut payload: Payload,
        success: bool,
    ) -> Result<Option<JobId>, JobError> {
        payload.insert(SUCCESS_FIELD.to_string(), Value::Bool(success));

        let decision = action.route(&payload, success);
        let Some(target) = decision.target else {
            return Ok(None);
        };

        let priority = decision
            .priority
            .unwrap_or_else(|| carried_priority(&payload, Priority::default()));

        let chained = self.submit(&target, Some(decision.payload)).await?;
        self.enqueue(chained, priority).await?;
        info!(parent = %job_id, %chained, %target, "chained follow-up job");
        Ok(Some(chained))
    }
}
