use thiserror::Error;

use crate::auth::AuthError;
use crate::validation::{SecurityError, UsernameError};

/// Errors that can arise while reading or writing account records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Wrapper around IO errors (directory creation, locking, rename).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record on disk failed a size or format check.
    #[error("corrupt record: {0}")]
    Corrupt(#[from] SecurityError),

    /// Password hashing or hash parsing failed.
    #[error("password hash failure: {0}")]
    PasswordHash(String),

    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Returned when creating an account whose name is taken.
    #[error("account already exists: {0}")]
    Conflict(String),

    /// Returned when fetching or updating an account that is not present.
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("invalid level: {0}")]
    InvalidLevel(u32),
}

impl From<password_hash::Error> for StorageError {
    fn from(e: password_hash::Error) -> Self {
        StorageError::PasswordHash(e.to_string())
    }
}

/// Failure taxonomy of a single terminal command.
///
/// Only [`GameError::Auth`] leaves the session as an error; the other variants are turned into
/// displayable text where they occur.
#[derive(Debug, Error)]
pub enum GameError {
    /// Missing or malformed command arguments; answered with usage text, no remote call.
    #[error("{0}")]
    Validation(String),

    /// The account capability rejected REGISTER / LOGIN, or could not be reached.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Saving progress after a victory failed; the local advance stands.
    #[error("Progress save failed: {0}")]
    Persistence(AuthError),

    /// Unrecognized command.
    #[error("{0}")]
    Protocol(String),
}

impl GameError {
    /// Whether the session handles this failure itself instead of returning it.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GameError::Auth(_))
    }
}
