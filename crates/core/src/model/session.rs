use std::array;

use thiserror::Error;

use crate::model::answer::{Answer, SlotView};
use crate::model::subject::{Section, SlotKey, Subject};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("test name cannot be empty")]
    EmptyName,

    #[error("question {index} is out of range for {key} ({len} questions)")]
    IndexOutOfRange { key: SlotKey, index: usize, len: usize },

    #[error("{section} cannot have {count} questions (at most {max})")]
    TooManyQuestions {
        section: Section,
        count: u64,
        max: u32,
    },

    #[error("{key} has {actual} answers but the section has {expected} questions")]
    LengthMismatch {
        key: SlotKey,
        expected: usize,
        actual: usize,
    },
}

//
// ─── SECTION COUNTS ────────────────────────────────────────────────────────────
//

/// Number of questions per section, shared by every subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCounts {
    section1: u32,
    section2: u32,
}

impl SectionCounts {
    pub const DEFAULT_SECTION1: u32 = 20;
    pub const DEFAULT_SECTION2: u32 = 10;
    /// Upper bound on questions in one section.
    pub const MAX_PER_SECTION: u32 = 500;

    /// Counts capped at `MAX_PER_SECTION`.
    #[must_use]
    pub fn new(section1: u32, section2: u32) -> Self {
        Self {
            section1: section1.min(Self::MAX_PER_SECTION),
            section2: section2.min(Self::MAX_PER_SECTION),
        }
    }

    /// Counts that must already be within bounds, for data read back from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TooManyQuestions` for a count above `MAX_PER_SECTION`.
    pub fn checked(section1: u64, section2: u64) -> Result<Self, SessionError> {
        let check = |section: Section, count: u64| {
            u32::try_from(count)
                .ok()
                .filter(|&c| c <= Self::MAX_PER_SECTION)
                .ok_or(SessionError::TooManyQuestions {
                    section,
                    count,
                    max: Self::MAX_PER_SECTION,
                })
        };
        Ok(Self {
            section1: check(Section::Section1, section1)?,
            section2: check(Section::Section2, section2)?,
        })
    }

    /// Build counts from signed user input, clamped to `0..=MAX_PER_SECTION`.
    #[must_use]
    pub fn clamped(section1: i64, section2: i64) -> Self {
        let clamp = |v: i64| {
            let capped = v.clamp(0, i64::from(Self::MAX_PER_SECTION));
            u32::try_from(capped).unwrap_or(Self::MAX_PER_SECTION)
        };
        Self::new(clamp(section1), clamp(section2))
    }

    #[must_use]
    pub fn section1(&self) -> u32 {
        self.section1
    }

    #[must_use]
    pub fn section2(&self) -> u32 {
        self.section2
    }

    #[must_use]
    pub fn get(&self, section: Section) -> u32 {
        match section {
            Section::Section1 => self.section1,
            Section::Section2 => self.section2,
        }
    }

    /// Questions in one subject (both sections).
    #[must_use]
    pub fn per_subject(&self) -> u64 {
        u64::from(self.section1) + u64::from(self.section2)
    }

    /// Questions across all subjects and sections.
    #[must_use]
    pub fn total_slots(&self) -> u64 {
        self.per_subject() * Subject::ALL.len() as u64
    }
}

impl Default for SectionCounts {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SECTION1, Self::DEFAULT_SECTION2)
    }
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// Fixed-size answer arrays for every `(subject, section)` pair.
///
/// Array lengths are set at construction and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: [[Vec<Option<Answer>>; 2]; 3],
}

impl AnswerSheet {
    /// All slots unanswered.
    #[must_use]
    pub fn empty(counts: SectionCounts) -> Self {
        Self {
            slots: array::from_fn(|_| {
                array::from_fn(|section| {
                    let len = counts.get(Section::ALL[section]) as usize;
                    vec![None; len]
                })
            }),
        }
    }

    /// Rehydrate a sheet from persisted arrays.
    ///
    /// The loaded vectors are kept as they are; nothing is allocated from
    /// `counts` alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LengthMismatch` if any array disagrees with `counts`.
    pub fn from_persisted(
        counts: SectionCounts,
        mut arrays: impl FnMut(SlotKey) -> Vec<Option<Answer>>,
    ) -> Result<Self, SessionError> {
        let mut sheet = Self {
            slots: Default::default(),
        };
        for key in SlotKey::all() {
            let loaded = arrays(key);
            let expected = counts.get(key.section) as usize;
            if loaded.len() != expected {
                return Err(SessionError::LengthMismatch {
                    key,
                    expected,
                    actual: loaded.len(),
                });
            }
            *sheet.slots_mut(key) = loaded;
        }
        Ok(sheet)
    }

    #[must_use]
    pub fn slots(&self, key: SlotKey) -> &[Option<Answer>] {
        &self.slots[key.subject.index()][key.section.index()]
    }

    fn slots_mut(&mut self, key: SlotKey) -> &mut Vec<Option<Answer>> {
        &mut self.slots[key.subject.index()][key.section.index()]
    }

    #[must_use]
    pub fn get(&self, key: SlotKey, index: usize) -> Option<&Answer> {
        self.slots(key).get(index).and_then(Option::as_ref)
    }

    /// Overwrite a slot; last write wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if `index` is past the section length.
    pub fn set(
        &mut self,
        key: SlotKey,
        index: usize,
        answer: Option<Answer>,
    ) -> Result<Option<Answer>, SessionError> {
        let slots = self.slots_mut(key);
        let len = slots.len();
        let slot = slots
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { key, index, len })?;
        Ok(std::mem::replace(slot, answer))
    }

    /// Per-slot input state for restoring a form.
    pub fn views(&self, key: SlotKey) -> impl Iterator<Item = SlotView<'_>> {
        self.slots(key).iter().map(|slot| SlotView::of(slot.as_ref()))
    }

    /// Iterate `(key, slots)` for all six arrays.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &[Option<Answer>])> {
        SlotKey::all().map(move |key| (key, self.slots(key)))
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The in-progress mock test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSession {
    name: String,
    counts: SectionCounts,
    answers: AnswerSheet,
}

impl ExamSession {
    /// Start a fresh session with every slot unanswered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyName` if the trimmed name is empty.
    pub fn new(name: impl AsRef<str>, counts: SectionCounts) -> Result<Self, SessionError> {
        let name = normalize_name(name.as_ref())?;
        Ok(Self {
            name,
            counts,
            answers: AnswerSheet::empty(counts),
        })
    }

    /// Rehydrate a session from a saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the name is empty or the sheet does not fit `counts`.
    pub fn from_persisted(
        name: impl AsRef<str>,
        counts: SectionCounts,
        answers: AnswerSheet,
    ) -> Result<Self, SessionError> {
        let name = normalize_name(name.as_ref())?;
        for key in SlotKey::all() {
            let expected = counts.get(key.section) as usize;
            let actual = answers.slots(key).len();
            if actual != expected {
                return Err(SessionError::LengthMismatch {
                    key,
                    expected,
                    actual,
                });
            }
        }
        Ok(Self {
            name,
            counts,
            answers,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn counts(&self) -> SectionCounts {
        self.counts
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, key: SlotKey, index: usize) -> Option<&Answer> {
        self.answers.get(key, index)
    }

    /// Record the latest value for a slot and return the one it replaced.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` for an index past the section length.
    pub fn set_answer(
        &mut self,
        key: SlotKey,
        index: usize,
        answer: Option<Answer>,
    ) -> Result<Option<Answer>, SessionError> {
        self.answers.set(key, index, answer)
    }
}

fn normalize_name(raw: &str) -> Result<String, SessionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyName);
    }
    Ok(trimmed.to_owned())
}
