use chrono::{DateTime, Utc};

use crate::model::session::ExamSession;

/// Durable mirror of the running test, used only to resume after an interruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSnapshot {
    session: ExamSession,
    elapsed_seconds: u64,
    saved_at: DateTime<Utc>,
}

impl LiveSnapshot {
    /// Project the live session into a snapshot. Pure; nothing is written.
    #[must_use]
    pub fn capture(session: &ExamSession, elapsed_seconds: u64, saved_at: DateTime<Utc>) -> Self {
        Self {
            session: session.clone(),
            elapsed_seconds,
            saved_at,
        }
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    #[must_use]
    pub fn into_parts(self) -> (ExamSession, u64) {
        (self.session, self.elapsed_seconds)
    }
}
