use exam_core::Progress;
use exam_core::model::{Answer, ExamSession, SectionCounts, SessionError, SlotKey};
use tracing::{debug, warn};

/// Holds the single in-progress test.
///
/// All answer writes go through here; progress is recomputed on every write.
#[derive(Debug, Default)]
pub struct SessionStore {
    active: Option<ExamSession>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new test, replacing any active one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyName` if the trimmed name is empty.
    pub fn create_session(
        &mut self,
        name: &str,
        counts: SectionCounts,
    ) -> Result<&ExamSession, SessionError> {
        let session = ExamSession::new(name, counts)?;
        debug!(
            name = session.name(),
            section1 = counts.section1(),
            section2 = counts.section2(),
            "created session"
        );
        Ok(self.active.insert(session))
    }

    /// Install a session restored from a snapshot.
    pub fn restore(&mut self, session: ExamSession) -> &ExamSession {
        self.active.insert(session)
    }

    /// Record raw input for a slot. Empty input marks the slot unanswered.
    ///
    /// Returns the recomputed progress, or `None` when the write was ignored.
    pub fn set_answer(&mut self, key: SlotKey, index: usize, raw: &str) -> Option<Progress> {
        self.set(key, index, Answer::parse(raw))
    }

    /// Record a typed answer for a slot; last write wins.
    ///
    /// Writes with no active test or an out-of-range index are ignored and logged.
    pub fn set(&mut self, key: SlotKey, index: usize, answer: Option<Answer>) -> Option<Progress> {
        let Some(session) = self.active.as_mut() else {
            warn!(%key, index, "ignoring answer: no test in progress");
            return None;
        };
        if let Err(err) = session.set_answer(key, index, answer) {
            warn!(error = %err, "ignoring answer");
            return None;
        }
        debug!(%key, index, value = ?session.answer(key, index), "answer recorded");
        Some(Progress::of_session(session))
    }

    /// Drop the active test. Idempotent.
    pub fn clear_session(&mut self) -> Option<ExamSession> {
        self.active.take()
    }

    #[must_use]
    pub fn active(&self) -> Option<&ExamSession> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Progress of the active test; zero when none is running.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.active
            .as_ref()
            .map(Progress::of_session)
            .unwrap_or_default()
    }
}
