//! Transportable job envelope: action code + merged payload.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::action::ActionCode;
use super::errors::JobError;

/// Payload passed to and from handlers: an ordered mapping of business fields.
pub type Payload = serde_json::Map<String, Value>;

/// Compacted form of a job: the action code plus the payload as it should
/// reach the handler.
///
/// The text encoding (`{"code": ..., "more": {...}}`) is the storage/transport
/// format; equal envelopes always encode to the same text, so envelopes can be
/// compared and deduplicated as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub code: ActionCode,

    #[serde(rename = "more", default)]
    pub payload: Payload,
}

impl JobEnvelope {
    pub fn new(code: ActionCode, payload: Payload) -> Self {
        Self { code, payload }
    }

    /// Serialize into the transportable text form.
    pub fn encode(&self) -> String {
        json!({ "code": self.code, "more": self.payload }).to_string()
    }

    /// Parse the transportable text form.
    pub fn decode(text: &str) -> Result<Self, JobError> {
        serde_json::from_str(text).map_err(|e| JobError::MalformedEnvelope(e.to_string()))
    }
}

/// Merge a caller-supplied payload over registered defaults.
///
/// Override keys win; default keys without an override pass through unchanged.
pub fn merge_defaults(defaults: &Payload, overrides: Payload) -> Payload {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = JobEnvelope::new(
            ActionCode::new("Greet"),
            payload(json!({"name": "Viktor", "count": 2})),
        );
        let text = envelope.encode();
        assert_eq!(JobEnvelope::decode(&text).unwrap(), envelope);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = JobEnvelope::new(ActionCode::new("X"), payload(json!({"b": 1, "a": 2})));
        let b = JobEnvelope::new(ActionCode::new("X"), payload(json!({"a": 2, "b": 1})));
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn decode_rejects_non_envelope_text() {
        assert!(matches!(
            JobEnvelope::decode("definitely not json"),
            Err(JobError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            JobEnvelope::decode("[1, 2, 3]"),
            Err(JobError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            JobEnvelope::decode(r#"{"more": {}}"#),
            Err(JobError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn decode_tolerates_missing_payload() {
        let envelope = JobEnvelope::decode(r#"{"code": "Greet"}"#).unwrap();
        assert_eq!(envelope.code.as_str(), "Greet");
        assert!(envelope.payload.is_empty());
    }

    #[test]
    fn merge_prefers_overrides_and_keeps_defaults() {
        let defaults = payload(json!({"name": "Oleksandr", "lang": "uk"}));
        let merged = merge_defaults(&defaults, payload(json!({"name": "Viktor"})));
        assert_eq!(merged["name"], "Viktor");
        assert_eq!(merged["lang"], "uk");
    }

    #[test]
    fn merge_with_empty_overrides_is_defaults() {
        let defaults = payload(json!({"name": "Oleksandr"}));
        assert_eq!(merge_defaults(&defaults, Payload::new()), defaults);
    }
}
