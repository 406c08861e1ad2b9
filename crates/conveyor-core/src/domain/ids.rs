//! Durable job identifier.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Display prefix, also expected back when parsing.
const PREFIX: &str = "job-";

/// Identifier of a persisted job record.
///
/// The string form (`job-<ulid>`) is what travels through the submission
/// queue; a dequeued string is parsed back into a `JobId` before the store
/// is consulted. ULIDs sort by creation time, which keeps store listings in
/// submission order for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Ulid);

impl JobId {
    /// Generate a fresh id stamped with the current wall clock.
    pub fn generate() -> Self {
        let timestamp_ms = Utc::now().timestamp_millis() as u64;
        Self(Ulid::from_parts(timestamp_ms, rand::random()))
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job id")]
pub struct ParseJobIdError;

impl FromStr for JobId {
    type Err = ParseJobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(PREFIX).ok_or(ParseJobIdError)?;
        Ulid::from_string(raw).map(Self).map_err(|_| ParseJobIdError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrips_through_from_str() {
        let id = JobId::generate();
        let text = id.to_string();
        assert!(text.starts_with("job-"));
        assert_eq!(text.parse::<JobId>().unwrap(), id);
    }

    #[test]
    fn rejects_unprefixed_or_garbage_input() {
        assert!("01H0000000000000000000000".parse::<JobId>().is_err());
        assert!("job-not-a-ulid".parse::<JobId>().is_err());
        assert!("{\"code\":\"X\"}".parse::<JobId>().is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_sortable() {
        let a = JobId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = JobId::generate();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
