use std::sync::Arc;

use async_trait::async_trait;
use exam_core::Clock;
use exam_core::model::{ExamSession, LiveSnapshot};
use storage::repository::{LiveTestRepository, StorageError};
use tracing::{debug, info};

/// Yes/no confirmation asked of the user before restoring a saved test.
#[async_trait]
pub trait ConfirmPrompt: Send {
    async fn confirm(&mut self, message: &str) -> bool;
}

/// Where a resume request came from; only the wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePath {
    /// Offered automatically when the app starts.
    Launch,
    /// Requested explicitly from the dashboard.
    Quick,
}

impl ResumePath {
    #[must_use]
    pub fn message(self, name: &str) -> String {
        match self {
            ResumePath::Launch => {
                format!("Found an unfinished test \"{name}\". Would you like to resume?")
            }
            ResumePath::Quick => format!("Resume \"{name}\"?"),
        }
    }
}

/// Result of a resume attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed(LiveSnapshot),
    /// The user said no. The snapshot stays in storage.
    Declined,
    NothingToResume,
}

/// Writes and reads the single live-test snapshot.
#[derive(Clone)]
pub struct AutosaveService {
    clock: Clock,
    live: Arc<dyn LiveTestRepository>,
}

impl AutosaveService {
    #[must_use]
    pub fn new(clock: Clock, live: Arc<dyn LiveTestRepository>) -> Self {
        Self { clock, live }
    }

    /// Project the session into a snapshot stamped with the current time.
    #[must_use]
    pub fn snapshot(&self, session: &ExamSession, elapsed_seconds: u64) -> LiveSnapshot {
        LiveSnapshot::capture(session, elapsed_seconds, self.clock.now())
    }

    /// Persist a snapshot, replacing whatever was saved before.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    pub async fn save(
        &self,
        session: &ExamSession,
        elapsed_seconds: u64,
    ) -> Result<LiveSnapshot, StorageError> {
        let snapshot = self.snapshot(session, elapsed_seconds);
        self.live.save_live(&snapshot).await?;
        Ok(snapshot)
    }

    /// Peek at the saved snapshot without restoring it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; malformed data reads as `None`.
    pub async fn pending(&self) -> Result<Option<LiveSnapshot>, StorageError> {
        self.live.load_live().await
    }

    /// Offer to restore the saved snapshot.
    ///
    /// The prompt is only asked when a snapshot exists. Declining leaves it in
    /// storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn try_resume(
        &self,
        path: ResumePath,
        prompt: &mut dyn ConfirmPrompt,
    ) -> Result<ResumeOutcome, StorageError> {
        let Some(snapshot) = self.pending().await? else {
            debug!(?path, "no live test to resume");
            return Ok(ResumeOutcome::NothingToResume);
        };

        let message = path.message(snapshot.session().name());
        if prompt.confirm(&message).await {
            info!(
                name = snapshot.session().name(),
                elapsed = snapshot.elapsed_seconds(),
                "resuming live test"
            );
            Ok(ResumeOutcome::Resumed(snapshot))
        } else {
            info!(name = snapshot.session().name(), "resume declined");
            Ok(ResumeOutcome::Declined)
        }
    }

    /// Remove the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn discard(&self) -> Result<(), StorageError> {
        self.live.clear_live().await
    }
}
