//! Handler trait and factory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::route::resolve;
use crate::domain::{JobError, Payload, RouteDecision};

/// An executable handler for one implementation id.
///
/// `exec` receives the merged payload and a cooperative cancellation token; a
/// handler that wants to stop early observes the token and returns
/// [`JobError::Cancelled`]. Handlers that never look at the token simply run
/// to completion.
#[async_trait]
pub trait Action: Send + Sync {
    async fn exec(&self, payload: &Payload, cancel: &CancellationToken) -> Result<(), JobError>;

    /// Chaining hook, invoked by the lifecycle manager after the terminal
    /// outcome is durably recorded. The payload carries the injected control
    /// fields ([`SUCCESS_FIELD`](crate::domain::SUCCESS_FIELD) and the
    /// priority hint) on top of the handler's own fields.
    ///
    /// The default is the standard prefix-remapping resolver; override to
    /// customize where (or whether) an action chains.
    fn route(&self, payload: &Payload, success: bool) -> RouteDecision {
        resolve(payload, success)
    }
}

/// Resolves an implementation id to an executable handler.
pub trait ActionFactory: Send + Sync {
    fn create(&self, impl_id: &str) -> Result<Arc<dyn Action>, JobError>;
}

/// Factory backed by a fixed map of handlers.
///
/// Built during initialization (mutable), used during runtime (immutable
/// behind an `Arc`), so lookups need no lock.
#[derive(Default)]
pub struct ActionSet {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionSet {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        impl_id: impl Into<String>,
        action: Arc<dyn Action>,
    ) -> Result<(), JobError> {
        let impl_id = impl_id.into();
        if self.actions.contains_key(&impl_id) {
            return Err(JobError::DuplicateHandler(impl_id));
        }
        self.actions.insert(impl_id, action);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionFactory for ActionSet {
    fn create(&self, impl_id: &str) -> Result<Arc<dyn Action>, JobError> {
        self.actions
            .get(impl_id)
            .cloned()
            .ok_or_else(|| JobError::HandlerNotFound(impl_id.to_string()))
    }
}
