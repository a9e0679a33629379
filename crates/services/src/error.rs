//! Shared error types for the services crate.

use thiserror::Error;

use lessons_core::model::{IdError, ProgressError, QuizError, UserError, WeeklyError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors surfaced by the tracker services.
///
/// Domain validation failures collapse into `Validation`; storage failures are
/// carried through unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid email or password")]
    Unauthorized,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TrackerError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

impl From<IdError> for TrackerError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ProgressError> for TrackerError {
    fn from(err: ProgressError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<UserError> for TrackerError {
    fn from(err: UserError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<WeeklyError> for TrackerError {
    fn from(err: WeeklyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<QuizError> for TrackerError {
    fn from(err: QuizError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Errors emitted by notifiers. Callers log these and move on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("notifier is not configured")]
    Disabled,
    #[error("notification request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
