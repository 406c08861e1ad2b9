//! Reloadable runtime settings.
//!
//! An opaque key/value configuration surface (worker parallelism,
//! per-priority capacity ceilings, fairness weights, ...) that the core
//! accepts and hands to collaborators without interpreting. Same snapshot
//! discipline as the action registry: wholesale swap, no torn reads.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, watch};

use crate::domain::{JobError, Payload};

pub struct SettingsRegistry {
    values: RwLock<Arc<Payload>>,
    reloaded: watch::Sender<u64>,
}

impl SettingsRegistry {
    pub fn new(initial: Payload) -> Self {
        let (reloaded, _) = watch::channel(0);
        Self {
            values: RwLock::new(Arc::new(initial)),
            reloaded,
        }
    }

    pub fn empty() -> Self {
        Self::new(Payload::new())
    }

    /// Typed lookup; `None` when the key is absent or does not deserialize
    /// into `T`.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().await;
        values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Typed lookup with a default for absent or mistyped keys.
    pub async fn get_value<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.try_get(key).await.unwrap_or(default)
    }

    /// Read-only view of the current values.
    pub async fn snapshot(&self) -> Arc<Payload> {
        Arc::clone(&*self.values.read().await)
    }

    /// Atomic wholesale replacement.
    pub async fn reload(&self, new_values: Payload) {
        *self.values.write().await = Arc::new(new_values);
        self.reloaded.send_modify(|generation| *generation += 1);
    }

    /// Replace from a JSON object; a parse failure leaves the active values
    /// untouched.
    pub async fn reload_from_json(&self, json: &str) -> Result<(), JobError> {
        let parsed: Payload =
            serde_json::from_str(json).map_err(|e| JobError::InvalidSettings(e.to_string()))?;
        self.reload(parsed).await;
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.reloaded.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn typed_access_with_default() {
        let settings = SettingsRegistry::new(payload(json!({
            "MaxParallelJobs": 2,
            "HighCapacity": 16
        })));

        assert_eq!(settings.get_value("MaxParallelJobs", 8usize).await, 2);
        assert_eq!(settings.get_value("HighCapacity", 4u32).await, 16);
        assert_eq!(settings.get_value("Missing", 4u32).await, 4);
    }

    #[tokio::test]
    async fn mistyped_value_falls_back() {
        let settings = SettingsRegistry::new(payload(json!({"MaxParallelJobs": "many"})));
        assert_eq!(settings.try_get::<u32>("MaxParallelJobs").await, None);
        assert_eq!(settings.get_value("MaxParallelJobs", 1u32).await, 1);
    }

    #[tokio::test]
    async fn reload_swaps_values_and_notifies() {
        let settings = SettingsRegistry::empty();
        let mut rx = settings.subscribe();

        settings
            .reload_from_json(r#"{"MaxParallelJobs": 4}"#)
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(settings.get_value("MaxParallelJobs", 1u32).await, 4);
    }

    #[tokio::test]
    async fn malformed_reload_keeps_previous_values() {
        let settings = SettingsRegistry::new(payload(json!({"MaxParallelJobs": 2})));
        assert!(settings.reload_from_json("nope").await.is_err());
        assert_eq!(settings.get_value("MaxParallelJobs", 0u32).await, 2);
    }
}
