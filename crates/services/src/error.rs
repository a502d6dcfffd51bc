//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the exam controller and its services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("a test is already in progress")]
    AlreadyActive,
    #[error("no test in progress")]
    NoActiveTest,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
