#![forbid(unsafe_code)]

pub mod records;
pub mod repository;
pub mod sqlite;

pub use repository::{
    ArchiveRepository, InMemoryStore, KeyValueStore, LiveTestRepository, PreferencesRepository,
    Storage, StorageError,
};
