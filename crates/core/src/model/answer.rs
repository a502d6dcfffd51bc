use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One of the multiple-choice options offered for every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub const ALL: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }

    fn from_exact(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.as_str() == raw)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded answer for a single question slot.
///
/// A slot holds either a choice or free text, never both: writing one
/// replaces the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Answer {
    Choice(Choice),
    Custom(String),
}

impl Answer {
    /// Normalize raw input into an answer.
    ///
    /// Input is trimmed; an empty result is "unanswered" and yields `None`.
    /// A value that is exactly an option letter is a choice, anything else
    /// is custom text.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match Choice::from_exact(trimmed) {
            Some(choice) => Answer::Choice(choice),
            None => Answer::Custom(trimmed.to_owned()),
        })
    }

    #[must_use]
    pub fn custom(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        (!trimmed.is_empty()).then(|| Answer::Custom(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Answer::Choice(choice) => choice.as_str(),
            Answer::Custom(text) => text,
        }
    }

}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Answer::parse(&raw).ok_or_else(|| serde::de::Error::custom("empty answer"))
    }
}

/// What an input form should show for one slot after a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotView<'a> {
    pub choice: Option<Choice>,
    pub custom: Option<&'a str>,
}

impl<'a> SlotView<'a> {
    #[must_use]
    pub fn of(slot: Option<&'a Answer>) -> Self {
        match slot {
            Some(Answer::Choice(choice)) => Self {
                choice: Some(*choice),
                custom: None,
            },
            Some(Answer::Custom(text)) => Self {
                choice: None,
                custom: Some(text),
            },
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.choice.is_some() || self.custom.is_some()
    }
}
