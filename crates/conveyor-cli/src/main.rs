//! Demo wiring for the conveyor job core.
//!
//! Registers two console actions, submits a job whose defaults declare a
//! follow-up, lets a small worker group drain the queue, then prints the
//! resulting history.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use conveyor_core::action::{Action, ActionSet};
use conveyor_core::domain::{ActionCode, ActionItem, JobError, Payload, Priority};
use conveyor_core::processor::JobProcessor;
use conveyor_core::queue::{InMemoryJobQueue, JobQueue};
use conveyor_core::registry::{ActionMap, ActionRegistry};
use conveyor_core::settings::SettingsRegistry;
use conveyor_core::store::{JobStore, MemoryJobStore};
use conveyor_core::worker::WorkerGroup;

struct GreetAction;

#[async_trait]
impl Action for GreetAction {
    async fn exec(&self, payload: &Payload, _cancel: &CancellationToken) -> Result<(), JobError> {
        let name = payload.get("name").and_then(Value::as_str).unwrap_or("World");
        info!("Hello {name}!");
        Ok(())
    }
}

struct NotifyAction;

#[async_trait]
impl Action for NotifyAction {
    async fn exec(&self, payload: &Payload, _cancel: &CancellationToken) -> Result<(), JobError> {
        let to = payload.get("to").and_then(Value::as_str).unwrap_or("(missing)");
        info!("Notifying {to}");
        Ok(())
    }
}

struct FailSometimesAction;

#[async_trait]
impl Action for FailSometimesAction {
    async fn exec(&self, payload: &Payload, _cancel: &CancellationToken) -> Result<(), JobError> {
        if payload.get("should_fail").and_then(Value::as_bool) == Some(true) {
            return Err(JobError::fault("boom"));
        }
        Ok(())
    }
}

fn object(value: Value) -> Payload {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), JobError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    // (A) Action map: codes -> implementation ids + default payloads.
    // Greet's defaults declare the follow-up: on success, chain "Notify"
    // and forward next_to as its "to" field.
    let registry = Arc::new(ActionRegistry::new(ActionMap::from([
        (
            ActionCode::new("Greet"),
            ActionItem::new(
                "greet",
                object(json!({"next": "Notify", "next_to": "Viktor"})),
            ),
        ),
        (
            ActionCode::new("Notify"),
            ActionItem::new("notify", Payload::new()),
        ),
        (
            ActionCode::new("FailSometimes"),
            ActionItem::new("fail-sometimes", object(json!({"fail_note": "cleanup"}))),
        ),
    ])));

    let mut actions = ActionSet::new();
    actions.register("greet", Arc::new(GreetAction))?;
    actions.register("notify", Arc::new(NotifyAction))?;
    actions.register("fail-sometimes", Arc::new(FailSometimesAction))?;

    // (B) Collaborators: in-memory store + queue, settings for parallelism.
    let settings = SettingsRegistry::new(object(json!({"MaxParallelJobs": 2})));
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(InMemoryJobQueue::new());

    let processor = Arc::new(JobProcessor::new(
        registry,
        Arc::new(actions),
        store.clone() as Arc<dyn JobStore>,
        queue.clone() as Arc<dyn JobQueue>,
    ));

    // (C) Worker group sized from settings.
    let parallelism = settings.get_value("MaxParallelJobs", 1usize).await;
    let group = WorkerGroup::spawn(
        parallelism,
        queue.clone() as Arc<dyn JobQueue>,
        processor.clone(),
    );

    // (D) Submit: a chained greeting plus a failing job.
    let greet = processor
        .submit(&ActionCode::new("Greet"), Some(object(json!({"name": "Viktor"}))))
        .await?;
    processor.enqueue(greet, Priority::High).await?;

    let flaky = processor
        .submit(
            &ActionCode::new("FailSometimes"),
            Some(object(json!({"should_fail": true}))),
        )
        .await?;
    processor.enqueue(flaky, Priority::Normal).await?;

    // (E) Three records are expected in history: the greeting, its chained
    // notification, and the failed job. Wait for them, then stop the workers.
    while store.history().await?.len() < 3 {
        sleep(Duration::from_millis(50)).await;
    }
    group.shutdown_and_join().await;

    // (F) Print the audit trail.
    for record in store.history().await? {
        info!(
            job = %record.job_id,
            action = %record.action_code,
            status = ?record.status,
            priority = %record.priority,
            "history"
        );
    }
    Ok(())
}
