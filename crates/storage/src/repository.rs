use async_trait::async_trait;
use exam_core::model::{ArchivedTest, LiveSnapshot, Theme};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

use crate::records::{ArchivedTestRecord, LiveTestRecord};

/// Key holding the color scheme preference.
pub const THEME_KEY: &str = "theme";
/// Key holding the snapshot of the test in progress.
pub const LIVE_TEST_KEY: &str = "liveTest";
/// Key holding the archived tests, newest first.
pub const RECENT_TESTS_KEY: &str = "recentTests";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE BACKENDS ────────────────────────────────────────────────────────
//

/// String-keyed store of JSON text values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store for tests and throwaway runs.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

#[async_trait]
pub trait LiveTestRepository: Send + Sync {
    /// Load the saved in-progress test, if any.
    ///
    /// Malformed data is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for backend failures.
    async fn load_live(&self) -> Result<Option<LiveSnapshot>, StorageError>;

    /// Replace the saved in-progress test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save_live(&self, snapshot: &LiveSnapshot) -> Result<(), StorageError>;

    /// Remove the saved in-progress test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_live(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Load archived tests, newest first. Unreadable entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for backend failures.
    async fn load_archive(&self) -> Result<Vec<ArchivedTest>, StorageError>;

    /// Replace the whole archive list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    async fn save_archive(&self, records: &[ArchivedTest]) -> Result<(), StorageError>;
}

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Load the stored theme, `None` when unset or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for backend failures.
    async fn load_theme(&self) -> Result<Option<Theme>, StorageError>;

    /// Persist the theme.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError>;
}

/// JSON repositories layered over any `KeyValueStore`.
#[derive(Clone)]
pub struct KvRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(key, &raw).await
    }
}

#[async_trait]
impl LiveTestRepository for KvRepository {
    async fn load_live(&self) -> Result<Option<LiveSnapshot>, StorageError> {
        let Some(record) = self.read_json::<LiveTestRecord>(LIVE_TEST_KEY).await? else {
            return Ok(None);
        };
        match record.into_snapshot() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(key = LIVE_TEST_KEY, error = %err, "ignoring unusable live test");
                Ok(None)
            }
        }
    }

    async fn save_live(&self, snapshot: &LiveSnapshot) -> Result<(), StorageError> {
        let record = LiveTestRecord::from_snapshot(snapshot);
        self.write_json(LIVE_TEST_KEY, &record).await?;
        debug!(
            name = snapshot.session().name(),
            elapsed = snapshot.elapsed_seconds(),
            "saved live test"
        );
        Ok(())
    }

    async fn clear_live(&self) -> Result<(), StorageError> {
        self.store.remove(LIVE_TEST_KEY).await
    }
}

#[async_trait]
impl ArchiveRepository for KvRepository {
    async fn load_archive(&self) -> Result<Vec<ArchivedTest>, StorageError> {
        let Some(entries) = self
            .read_json::<Vec<serde_json::Value>>(RECENT_TESTS_KEY)
            .await?
        else {
            return Ok(Vec::new());
        };

        let mut records = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            let parsed = serde_json::from_value::<ArchivedTestRecord>(entry)
                .map_err(|e| e.to_string())
                .and_then(|record| record.into_archived().map_err(|e| e.to_string()));
            match parsed {
                Ok(record) => records.push(record),
                Err(error) => warn!(position, %error, "skipping unreadable archived test"),
            }
        }
        Ok(records)
    }

    async fn save_archive(&self, records: &[ArchivedTest]) -> Result<(), StorageError> {
        let rows: Vec<ArchivedTestRecord> =
            records.iter().map(ArchivedTestRecord::from_archived).collect();
        self.write_json(RECENT_TESTS_KEY, &rows).await
    }
}

#[async_trait]
impl PreferencesRepository for KvRepository {
    async fn load_theme(&self) -> Result<Option<Theme>, StorageError> {
        let Some(raw) = self.store.get(THEME_KEY).await? else {
            return Ok(None);
        };
        // Older data stores the bare word instead of a JSON string.
        let parsed = serde_json::from_str::<Theme>(&raw)
            .ok()
            .or_else(|| raw.parse::<Theme>().ok());
        if parsed.is_none() {
            warn!(key = THEME_KEY, value = %raw, "ignoring unknown theme");
        }
        Ok(parsed)
    }

    async fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.write_json(THEME_KEY, &theme).await
    }
}

/// Bundles the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub live: Arc<dyn LiveTestRepository>,
    pub archive: Arc<dyn ArchiveRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    /// Build typed repositories over a raw key-value backend.
    #[must_use]
    pub fn over(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = KvRepository::new(store);
        let live: Arc<dyn LiveTestRepository> = Arc::new(repo.clone());
        let archive: Arc<dyn ArchiveRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo);
        Self {
            live,
            archive,
            preferences,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over(Arc::new(InMemoryStore::new()))
    }
}
