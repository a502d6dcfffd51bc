use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a subject or section id cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {raw}")]
pub struct ParseKeyError {
    kind: &'static str,
    raw: String,
}

/// One of the three fixed exam subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
}

impl Subject {
    /// All subjects in display order.
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Mathematics => "mathematics",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Subject::Physics => 0,
            Subject::Chemistry => 1,
            Subject::Mathematics => 2,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "mathematics" | "maths" | "math" => Ok(Subject::Mathematics),
            _ => Err(ParseKeyError {
                kind: "subject",
                raw: s.to_owned(),
            }),
        }
    }
}

/// One of the two sections every subject is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Section1,
    Section2,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Section1, Section::Section2];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Section1 => "section1",
            Section::Section2 => "section2",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Section::Section1 => 0,
            Section::Section2 => 1,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "section1" | "1" => Ok(Section::Section1),
            "section2" | "2" => Ok(Section::Section2),
            _ => Err(ParseKeyError {
                kind: "section",
                raw: s.to_owned(),
            }),
        }
    }
}

/// Typed `(subject, section)` pair addressing one answer array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub subject: Subject,
    pub section: Section,
}

impl SlotKey {
    #[must_use]
    pub fn new(subject: Subject, section: Section) -> Self {
        Self { subject, section }
    }

    /// All six keys, subject-major.
    pub fn all() -> impl Iterator<Item = SlotKey> {
        Subject::ALL.into_iter().flat_map(|subject| {
            Section::ALL
                .into_iter()
                .map(move |section| SlotKey::new(subject, section))
        })
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::new(Subject::Physics, Section::Section1)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.subject, self.section)
    }
}
