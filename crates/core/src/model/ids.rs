use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an archived test.
///
/// Derived from the completion time in milliseconds. Serialized as a string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Next id for a record completed at `at`.
    ///
    /// Uses the millisecond timestamp, bumped past `newest` so ids stay
    /// strictly increasing even when two tests end within the same
    /// millisecond or the clock steps backwards.
    #[must_use]
    pub fn next(at: DateTime<Utc>, newest: Option<RecordId>) -> Self {
        let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
        match newest {
            Some(prev) if prev.0 >= millis => Self(prev.0.saturating_add(1)),
            _ => Self(millis),
        }
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse RecordId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for RecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RecordId::new)
            .map_err(|_| ParseIdError { raw: s.to_owned() })
    }
}

impl TryFrom<String> for RecordId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}
