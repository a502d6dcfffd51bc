use chrono::{DateTime, Utc};

use crate::model::ids::RecordId;
use crate::model::session::{AnswerSheet, ExamSession, SectionCounts};
use crate::progress::Progress;
use crate::time::completion_label;

/// Maximum number of archived tests kept, newest first.
pub const ARCHIVE_CAPACITY: usize = 20;

/// Name shown for an archived test that was saved without one.
pub const UNNAMED_TEST: &str = "Unnamed Test";

/// A finished test. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedTest {
    id: RecordId,
    name: String,
    counts: SectionCounts,
    answers: AnswerSheet,
    elapsed_seconds: u64,
    completed_at: DateTime<Utc>,
    completion_label: String,
    all_answered: bool,
}

impl ArchivedTest {
    /// Freeze a session at completion time.
    #[must_use]
    pub fn complete(
        id: RecordId,
        session: &ExamSession,
        elapsed_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: session.name().to_owned(),
            counts: session.counts(),
            answers: session.answers().clone(),
            elapsed_seconds,
            completed_at,
            completion_label: completion_label(completed_at),
            all_answered: Progress::of_session(session).is_complete(),
        }
    }

    /// Rehydrate a stored record.
    ///
    /// Older entries carry no completion flag; it is derived from the answers.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: RecordId,
        name: String,
        counts: SectionCounts,
        answers: AnswerSheet,
        elapsed_seconds: u64,
        completed_at: DateTime<Utc>,
        completion_label: String,
        all_answered: Option<bool>,
    ) -> Self {
        let all_answered =
            all_answered.unwrap_or_else(|| Progress::of_sheet(&answers).is_complete());
        Self {
            id,
            name,
            counts,
            answers,
            elapsed_seconds,
            completed_at,
            completion_label,
            all_answered,
        }
    }

    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNNAMED_TEST
        } else {
            &self.name
        }
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
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn completion_label(&self) -> &str {
        &self.completion_label
    }

    /// Question count shown on the dashboard card (both sections of one subject).
    #[must_use]
    pub fn question_count(&self) -> u64 {
        self.counts.per_subject()
    }

    /// Duration-based "completed": any record whose timer ran.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.elapsed_seconds > 0
    }

    /// Every slot had an answer when the test ended.
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.all_answered
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::of_sheet(&self.answers)
    }
}
