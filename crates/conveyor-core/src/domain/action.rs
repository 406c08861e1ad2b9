//! Action codes and their registered configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::envelope::Payload;

/// The public name a job is submitted under (e.g. `"Greet"`).
///
/// Codes are looked up in the [`ActionRegistry`](crate::registry::ActionRegistry)
/// to find the implementation id and default payload. Comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCode(String);

impl ActionCode {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ActionCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Registered configuration for one action code.
///
/// `impl_id` names the executable handler (resolved through an
/// [`ActionFactory`](crate::action::ActionFactory)); `defaults` is the payload
/// fragment merged under every submitted payload for this code.
///
/// Items are replaced wholesale on registry reload, never mutated in place;
/// the JSON field names (`type` / `more`) match the reload file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(rename = "type")]
    pub impl_id: String,

    #[serde(rename = "more", default)]
    pub defaults: Payload,
}

impl ActionItem {
    pub fn new(impl_id: impl Into<String>, defaults: Payload) -> Self {
        Self {
            impl_id: impl_id.into(),
            defaults,
        }
    }
}
