//! Chained-routing resolver.
//!
//! After a job reaches a terminal outcome, its payload may declare a follow-up
//! action: the `"next"` key on success, the `"fail"` key on failure. Payload
//! keys carrying the matching prefix (`"next_"` / `"fail_"`) are forwarded to
//! the follow-up with the prefix stripped; everything else stays behind, so a
//! handler passes data forward without leaking its whole namespace.

use serde_json::Value;

use super::action::ActionCode;
use super::envelope::Payload;
use super::priority::Priority;

/// Control field injected before the chaining hook runs: whether the
/// triggering execution succeeded.
pub const SUCCESS_FIELD: &str = "__success";

/// Control field carrying the triggering job's priority, used as the fallback
/// when no `<prefix>priority` override is present.
pub const PRIORITY_FIELD: &str = "__priority";

/// Control field carrying the durable identifier of the running job.
pub const JOB_ID_FIELD: &str = "__job_id";

/// What to do after an execution finished: the follow-up code (if any), the
/// payload remapped for it, and an optional priority override.
///
/// Ephemeral: produced once per execution and immediately re-encoded into a
/// new envelope when `target` is present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteDecision {
    pub target: Option<ActionCode>,
    pub payload: Payload,
    pub priority: Option<Priority>,
}

/// Compute the routing decision for a finished execution.
///
/// Pure and stateless: identical inputs always yield identical decisions.
pub fn resolve(payload: &Payload, success: bool) -> RouteDecision {
    let (code_key, prefix) = if success {
        ("next", "next_")
    } else {
        ("fail", "fail_")
    };

    let target = payload
        .get(code_key)
        .and_then(Value::as_str)
        .map(ActionCode::new);

    let mut routed = Payload::new();
    for (key, value) in payload {
        if let Some(stripped) = key.strip_prefix(prefix) {
            routed.insert(stripped.to_string(), value.clone());
        }
    }

    let priority = payload
        .get(&format!("{prefix}priority"))
        .and_then(Priority::from_value);

    RouteDecision {
        target,
        payload: routed,
        priority,
    }
}

/// Fallback priority carried in the payload (the injected [`PRIORITY_FIELD`]),
/// parsed loosely; anything unparseable or out of range falls back.
pub fn carried_priority(payload: &Payload, fallback: Priority) -> Priority {
    payload
        .get(PRIORITY_FIELD)
        .and_then(Priority::from_value)
        .unwrap_or(fallback)
}
