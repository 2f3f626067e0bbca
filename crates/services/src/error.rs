//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, ConfigError, SummaryError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session is not finished yet")]
    NotFinished,
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Errors reported by side-effect ports (sound, sharing, persistence).
///
/// None of these ever reach the state machine; callers log and move on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EffectError {
    #[error("native share is not supported")]
    ShareUnsupported,
    #[error("share was cancelled")]
    ShareCancelled,
    #[error("share failed: {0}")]
    Share(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("audio playback failed: {0}")]
    Audio(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
