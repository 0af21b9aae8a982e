//! # Account Capability
//!
//! The game talks to accounts through the [`AuthService`] trait: three request/response
//! operations (register, login, save progress) that either succeed with an [`AccountView`]
//! or fail with an [`AuthError`].
//!
//! ## Implementations
//!
//! - [`backend::LocalAuth`] - in-process, backed by the file-based [`crate::storage::AccountStore`].
//!   Also answers the JSON action protocol ([`wire`]) for embedding behind any transport.
//! - `remote::HttpAuth` (feature `remote`) - posts the JSON action protocol to an HTTP endpoint.
//!
//! ## Failures
//!
//! A capability rejection ([`AuthError::Rejected`]) carries a human-readable message and a
//! [`FailureKind`] status classification. Anything that kept the request from being answered
//! at all (connect errors, timeouts, undecodable replies) is an [`AuthError::Transport`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod backend;
#[cfg(feature = "remote")]
pub mod remote;
pub mod wire;

pub use backend::LocalAuth;
#[cfg(feature = "remote")]
pub use remote::HttpAuth;

/// Username/password pair for register and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Request to store a new level for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpdate {
    pub username: String,
    pub level: u32,
}

/// Account data returned on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub username: String,
    #[serde(deserialize_with = "wire::lenient_level")]
    pub level: u32,
}

/// Status classification of a rejected request, aligned with HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

impl FailureKind {
    pub fn status_code(self) -> u16 {
        match self {
            FailureKind::BadRequest => 400,
            FailureKind::Unauthorized => 401,
            FailureKind::NotFound => 404,
            FailureKind::Conflict => 409,
            FailureKind::Internal => 500,
        }
    }

    /// Classify an HTTP status. Unlisted 4xx codes count as bad requests, everything else as internal.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 | 403 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            409 => FailureKind::Conflict,
            400..=499 => FailureKind::BadRequest,
            _ => FailureKind::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The capability answered and refused the request.
    #[error("{message}")]
    Rejected { kind: FailureKind, message: String },

    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AuthError {
    pub fn rejected(kind: FailureKind, message: impl Into<String>) -> Self {
        AuthError::Rejected {
            kind,
            message: message.into(),
        }
    }

    /// Classification of a rejection; `None` for transport failures.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AuthError::Rejected { kind, .. } => Some(*kind),
            AuthError::Transport(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Transport(_))
    }
}

/// The remote account capability consumed by the game session.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. New accounts start at level 1.
    async fn register(&self, credentials: &Credentials) -> Result<AccountView, AuthError>;

    /// Check credentials and return the stored level.
    async fn login(&self, credentials: &Credentials) -> Result<AccountView, AuthError>;

    /// Persist a new level for an existing account.
    async fn update_level(&self, update: &LevelUpdate) -> Result<AccountView, AuthError>;
}
