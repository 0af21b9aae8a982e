//! In-process account endpoint over [`AccountStore`].

use async_trait::async_trait;
use log::{error, info, warn};

use super::wire::{ActionRequest, WireReply};
use super::{AccountView, AuthError, AuthService, Credentials, FailureKind, LevelUpdate};
use crate::errors::StorageError;
use crate::logutil::escape_log;
use crate::storage::{Account, AccountStore};
use crate::validation::validate_account_name;

const MSG_REQUIRED: &str = "Username and password are required.";
const MSG_BAD_NAME: &str = "Username must be 3-24 chars: letters, numbers, underscore.";
const MSG_TAKEN: &str = "Username already exists.";
const MSG_BAD_CREDENTIALS: &str = "Invalid credentials.";
const MSG_NAME_REQUIRED: &str = "Username is required.";
const MSG_LEVEL_MIN: &str = "Level must be at least 1.";
const MSG_NOT_FOUND: &str = "User not found.";
const MSG_INTERNAL: &str = "Internal server error.";

/// Account capability served directly from the local store.
pub struct LocalAuth {
    store: AccountStore,
}

impl LocalAuth {
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Answer one JSON action payload the way the HTTP endpoint does.
    pub async fn handle_json(&self, payload: &str) -> WireReply {
        let request = match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(value) if value.is_object() => serde_json::from_value::<ActionRequest>(value).ok(),
            _ => None,
        };
        let Some(request) = request else {
            return WireReply::error(FailureKind::BadRequest, "Invalid JSON payload.");
        };
        self.handle(request).await
    }

    /// Dispatch a decoded action request.
    pub async fn handle(&self, request: ActionRequest) -> WireReply {
        let action = request.action.trim().to_ascii_uppercase();
        let result = match action.as_str() {
            "REGISTER" => self
                .register_account(request.username.trim(), &request.password)
                .await
                .map(|user| ("Registration successful.", user)),
            "LOGIN" => self
                .check_login(request.username.trim(), &request.password)
                .await
                .map(|user| ("Login successful.", user)),
            "UPDATE_LEVEL" => self
                .store_level(request.username.trim(), request.level.unwrap_or(1))
                .await
                .map(|user| ("Progress updated.", user)),
            _ => Err(AuthError::rejected(FailureKind::BadRequest, "Unknown action.")),
        };
        match result {
            Ok((message, user)) => WireReply::ok(message, user),
            Err(AuthError::Rejected { kind, message }) => WireReply::error(kind, &message),
            Err(AuthError::Transport(_)) => WireReply::error(FailureKind::Internal, MSG_INTERNAL),
        }
    }

    async fn register_account(&self, username: &str, password: &str) -> Result<AccountView, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::rejected(FailureKind::BadRequest, MSG_REQUIRED));
        }
        if validate_account_name(username).is_err() {
            return Err(AuthError::rejected(FailureKind::BadRequest, MSG_BAD_NAME));
        }
        match self.store.create_account(username, password).await {
            Ok(account) => {
                info!(target: "security", "registered account {}", account.username);
                Ok(view(&account))
            }
            Err(StorageError::Conflict(_)) => {
                warn!(target: "security", "registration for taken name {}", escape_log(username));
                Err(AuthError::rejected(FailureKind::Conflict, MSG_TAKEN))
            }
            Err(StorageError::InvalidUsername(_)) => {
                Err(AuthError::rejected(FailureKind::BadRequest, MSG_BAD_NAME))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn check_login(&self, username: &str, password: &str) -> Result<AccountView, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::rejected(FailureKind::BadRequest, MSG_REQUIRED));
        }
        // Names that cannot exist are answered like a wrong password.
        if validate_account_name(username).is_err() {
            warn!(target: "security", "login with malformed name {}", escape_log(username));
            return Err(AuthError::rejected(FailureKind::Unauthorized, MSG_BAD_CREDENTIALS));
        }
        match self.store.verify_password(username, password).await {
            Ok((Some(account), true)) => {
                info!(target: "security", "login {}", account.username);
                Ok(view(&account))
            }
            Ok(_) => {
                warn!(target: "security", "failed login for {}", username);
                Err(AuthError::rejected(FailureKind::Unauthorized, MSG_BAD_CREDENTIALS))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn store_level(&self, username: &str, level: i64) -> Result<AccountView, AuthError> {
        if username.is_empty() {
            return Err(AuthError::rejected(FailureKind::BadRequest, MSG_NAME_REQUIRED));
        }
        if level < 1 {
            return Err(AuthError::rejected(FailureKind::BadRequest, MSG_LEVEL_MIN));
        }
        if validate_account_name(username).is_err() {
            return Err(AuthError::rejected(FailureKind::NotFound, MSG_NOT_FOUND));
        }
        let level = u32::try_from(level).unwrap_or(u32::MAX);
        match self.store.set_level(username, level).await {
            Ok(account) => Ok(view(&account)),
            Err(StorageError::NotFound(_)) => {
                warn!(target: "security", "level update for unknown account {}", username);
                Err(AuthError::rejected(FailureKind::NotFound, MSG_NOT_FOUND))
            }
            Err(StorageError::InvalidLevel(_)) => {
                Err(AuthError::rejected(FailureKind::BadRequest, MSG_LEVEL_MIN))
            }
            Err(e) => Err(internal(e)),
        }
    }
}

fn view(account: &Account) -> AccountView {
    AccountView {
        username: account.username.clone(),
        level: account.level.max(1),
    }
}

fn internal(e: StorageError) -> AuthError {
    error!("account store failure: {}", e);
    AuthError::rejected(FailureKind::Internal, MSG_INTERNAL)
}

#[async_trait]
impl AuthService for LocalAuth {
    async fn register(&self, credentials: &Credentials) -> Result<AccountView, AuthError> {
        self.register_account(credentials.username.trim(), &credentials.password)
            .await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AccountView, AuthError> {
        self.check_login(credentials.username.trim(), &credentials.password)
            .await
    }

    async fn update_level(&self, update: &LevelUpdate) -> Result<AccountView, AuthError> {
        self.store_level(update.username.trim(), i64::from(update.level))
            .await
    }
}
