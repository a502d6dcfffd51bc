//! Completion progress derived from an answer sheet.

use crate::model::{AnswerSheet, ExamSession, SlotKey};

/// Answered vs. total slot counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    /// Progress across all six arrays of a sheet.
    #[must_use]
    pub fn of_sheet(sheet: &AnswerSheet) -> Self {
        sheet
            .iter()
            .map(|(_, slots)| Self::of_slots(slots))
            .fold(Self::default(), |acc, p| Self {
                answered: acc.answered + p.answered,
                total: acc.total + p.total,
            })
    }

    #[must_use]
    pub fn of_session(session: &ExamSession) -> Self {
        Self::of_sheet(session.answers())
    }

    /// Progress for a single `(subject, section)` array.
    #[must_use]
    pub fn of_key(sheet: &AnswerSheet, key: SlotKey) -> Self {
        Self::of_slots(sheet.slots(key))
    }

    fn of_slots<T>(slots: &[Option<T>]) -> Self {
        Self {
            answered: slots.iter().filter(|slot| slot.is_some()).count(),
            total: slots.len(),
        }
    }

    /// Percentage in `[0, 100]`; `0` when there are no slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.answered as f64 / self.total as f64 * 100.0
    }

    /// Percentage rounded to the nearest whole number for display.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percent(&self) -> u8 {
        self.percent().round().clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}
