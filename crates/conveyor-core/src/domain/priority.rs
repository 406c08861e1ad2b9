//! Submission priority levels.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Priority of a queued job, lowest first.
///
/// The numeric values are part of the payload contract: a routing control key
/// may carry either the integer or the (case-insensitive) name. Anything
/// outside the defined range is treated as absent, never as an error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Immediate = 3,
}

impl Priority {
    pub const COUNT: usize = 4;

    /// All levels, lowest first. Index agrees with [`Priority::index`].
    pub const ALL: [Priority; Priority::COUNT] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Immediate,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: i64) -> Option<Self> {
        match i {
            0 => Some(Priority::Low),
            1 => Some(Priority::Normal),
            2 => Some(Priority::High),
            3 => Some(Priority::Immediate),
            _ => None,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Priority::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
    }

    /// Loose parse from a JSON value: a level name, a numeric string, or an
    /// integer. Unparseable and out-of-range values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                Self::from_name(s).or_else(|| s.trim().parse::<i64>().ok().and_then(Self::from_index))
            }
            Value::Number(n) => n.as_i64().and_then(Self::from_index),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Immediate => "Immediate",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::name(json!("High"), Some(Priority::High))]
    #[case::name_lowercase(json!("immediate"), Some(Priority::Immediate))]
    #[case::name_padded(json!(" normal "), Some(Priority::Normal))]
    #[case::integer(json!(0), Some(Priority::Low))]
    #[case::numeric_string(json!("2"), Some(Priority::High))]
    #[case::out_of_range(json!(7), None)]
    #[case::negative(json!(-1), None)]
    #[case::bogus_name(json!("bogus"), None)]
    #[case::wrong_type(json!({"level": 2}), None)]
    #[case::fractional(json!(1.5), None)]
    fn loose_parse(#[case] value: Value, #[case] expected: Option<Priority>) {
        assert_eq!(Priority::from_value(&value), expected);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::High < Priority::Immediate);
    }

    #[test]
    fn serializes_as_level_name() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
    }
}
