use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::archive::ArchiveService;
use crate::autosave::AutosaveService;
use crate::controller::ExamController;
use crate::error::AppServicesError;
use crate::theme_service::ThemeService;

/// Assembles the storage-backed services behind one handle.
#[derive(Clone)]
pub struct AppServices {
    autosave: AutosaveService,
    archive: ArchiveService,
    theme: ThemeService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over a throwaway in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            autosave: AutosaveService::new(clock, Arc::clone(&storage.live)),
            archive: ArchiveService::new(
                clock,
                Arc::clone(&storage.archive),
                Arc::clone(&storage.live),
            ),
            theme: ThemeService::new(Arc::clone(&storage.preferences)),
        }
    }

    /// A fresh controller with no active test.
    #[must_use]
    pub fn controller(&self) -> ExamController {
        ExamController::new(
            self.autosave.clone(),
            self.archive.clone(),
            self.theme.clone(),
        )
    }
}
