use std::sync::Arc;

use exam_core::model::Theme;
use storage::repository::{PreferencesRepository, StorageError};
use tracing::debug;

#[derive(Clone)]
pub struct ThemeService {
    repo: Arc<dyn PreferencesRepository>,
}

impl ThemeService {
    #[must_use]
    pub fn new(repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { repo }
    }

    /// Load the stored theme, or the default when unset.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn load(&self) -> Result<Theme, StorageError> {
        Ok(self.repo.load_theme().await?.unwrap_or_default())
    }

    /// Flip between light and dark and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be read or written.
    pub async fn toggle(&self) -> Result<Theme, StorageError> {
        let next = self.load().await?.toggled();
        self.repo.save_theme(next).await?;
        debug!(theme = %next, "theme changed");
        Ok(next)
    }
}
