//! Reloadable action defaults registry.
//!
//! Maps an action code to its [`ActionItem`] (implementation id + default
//! payload). Reads vastly outnumber writes, so the map lives behind an `Arc`
//! that is swapped wholesale on reload: a concurrent reader holds either the
//! old snapshot or the new one, never a partially-replaced map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::domain::{ActionCode, ActionItem, JobError};

pub type ActionMap = HashMap<ActionCode, ActionItem>;

pub struct ActionRegistry {
    map: RwLock<Arc<ActionMap>>,

    /// Reload generation, bumped on every successful reload. Subscribers
    /// (e.g. a scheduler watching for newly registered codes) await changes.
    reloaded: watch::Sender<u64>,
}

impl ActionRegistry {
    pub fn new(initial: ActionMap) -> Self {
        let (reloaded, _) = watch::channel(0);
        Self {
            map: RwLock::new(Arc::new(initial)),
            reloaded,
        }
    }

    pub fn empty() -> Self {
        Self::new(ActionMap::new())
    }

    /// Look up the registered item for a code.
    ///
    /// Returns a clone; registry entries are only ever replaced wholesale,
    /// never mutated through the value handed out here.
    pub async fn get(&self, code: &ActionCode) -> Result<ActionItem, JobError> {
        let map = self.map.read().await;
        map.get(code)
            .cloned()
            .ok_or_else(|| JobError::UnknownActionCode(code.clone()))
    }

    /// Read-only view of the current map for introspection and tooling.
    pub async fn snapshot(&self) -> Arc<ActionMap> {
        Arc::clone(&*self.map.read().await)
    }

    /// Atomic wholesale replacement of the registered set.
    pub async fn reload(&self, new_map: ActionMap) {
        *self.map.write().await = Arc::new(new_map);
        self.reloaded.send_modify(|generation| *generation += 1);
    }

    /// Replace the registered set from a JSON document of the form
    /// `{"Code": {"type": "impl-id", "more": {...}}, ...}`.
    ///
    /// A parse failure leaves the previously active map untouched.
    pub async fn reload_from_json(&self, json: &str) -> Result<(), JobError> {
        let parsed: HashMap<String, ActionItem> =
            serde_json::from_str(json).map_err(|e| JobError::InvalidActionMap(e.to_string()))?;
        let map = parsed
            .into_iter()
            .map(|(code, item)| (ActionCode::new(code), item))
            .collect();
        self.reload(map).await;
        Ok(())
    }

    /// Subscribe to reload notifications. The value is the reload generation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.reloaded.subscribe()
    }
}
