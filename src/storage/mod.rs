//! # Storage Module - Account Persistence
//!
//! File-based account records for Dungeon Fighter. Each account is one JSON document holding
//! the username, an Argon2id password hash, the stored level and the creation timestamp.
//!
//! ```text
//! data/
//! └── accounts/       ← <percent-encoded username>.json
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dungeon_fighter::storage::AccountStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = AccountStore::new("./data").await?;
//!     store.create_account("alice", "secret123").await?;
//!     let (account, ok) = store.verify_password("alice", "secret123").await?;
//!     assert!(ok);
//!     store.set_level("alice", account.map(|a| a.level + 1).unwrap_or(1)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Unique names**: a new record is claimed with create-new semantics, so two registrations
//!   racing for one name cannot both succeed.
//! - **Atomic writes**: records are written to a temp file, fsynced and renamed over the target
//!   while holding an exclusive `fs2` lock.
//! - **Bounded reads**: record files larger than 16 KiB are rejected before parsing.

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, warn};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::errors::StorageError;
use crate::validation::{
    secure_account_path, secure_json_parse, validate_account_name, validate_file_size,
};

const MAX_RECORD_BYTES: u64 = 16 * 1024;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

fn default_level() -> u32 {
    1
}

/// Main account storage interface
pub struct AccountStore {
    data_dir: String,
    argon2: Argon2<'static>,
}

impl AccountStore {
    /// Initialize storage with the given data directory
    pub async fn new(data_dir: &str) -> Result<Self> {
        Self::new_with_params(data_dir, None).await
    }

    /// Initialize storage with explicit Argon2 params
    pub async fn new_with_params(data_dir: &str, params: Option<Params>) -> Result<Self> {
        fs::create_dir_all(Path::new(data_dir).join("accounts")).await?;
        let argon2 = match params {
            Some(p) => Argon2::new(Algorithm::Argon2id, Version::V0x13, p),
            None => Argon2::default(),
        };
        Ok(AccountStore {
            data_dir: data_dir.to_string(),
            argon2,
        })
    }

    /// Return the base data directory path used by this store
    pub fn base_dir(&self) -> &str {
        &self.data_dir
    }

    /// Create a level-1 account. Fails with [`StorageError::Conflict`] when the name is taken.
    pub async fn create_account(&self, username: &str, password: &str) -> Result<Account> {
        let username = validate_account_name(username)?;
        let path = secure_account_path(&self.data_dir, username)?;

        // Claim the record first; create_new is the uniqueness check.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::Conflict(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let account = Account {
            username: username.to_string(),
            password_hash: self.hash_password(password)?,
            level: 1,
            created_at: Utc::now(),
        };
        if let Err(e) = Self::write_record(&path, &account).await {
            // Release the claimed name so the user can retry.
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }
        debug!("account created: {}", account.username);
        Ok(account)
    }

    /// Verify an account password; returns (account, bool match)
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Option<Account>, bool)> {
        let Some(account) = self.get_account(username).await? else {
            return Ok((None, false));
        };
        let parsed = PasswordHash::new(&account.password_hash)?;
        let ok = self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        Ok((Some(account), ok))
    }

    /// Store a new level for an existing account. Returns the updated account.
    pub async fn set_level(&self, username: &str, level: u32) -> Result<Account> {
        if level < 1 {
            return Err(StorageError::InvalidLevel(level));
        }
        let mut account = self
            .get_account(username)
            .await?
            .ok_or_else(|| StorageError::NotFound(username.to_string()))?;
        account.level = level;
        let path = secure_account_path(&self.data_dir, &account.username)?;
        Self::write_record(&path, &account).await?;
        Ok(account)
    }

    /// Get an account by name
    pub async fn get_account(&self, username: &str) -> Result<Option<Account>> {
        let path = secure_account_path(&self.data_dir, username)?;
        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        validate_file_size(metadata.len(), MAX_RECORD_BYTES)?;
        let content = fs::read_to_string(&path).await?;
        if content.trim_start_matches('\0').is_empty() {
            // Claimed by a registration that has not finished writing.
            return Ok(None);
        }
        let account: Account = secure_json_parse(&content, MAX_RECORD_BYTES as usize)?;
        Ok(Some(account))
    }

    /// All readable accounts, sorted by username. Unreadable records are skipped with a warning.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let dir = Path::new(&self.data_dir).join("accounts");
        let mut entries = fs::read_dir(&dir).await?;
        let mut accounts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping unreadable account file {:?}: {}", path, e);
                    continue;
                }
            };
            match secure_json_parse::<Account>(&content, MAX_RECORD_BYTES as usize) {
                Ok(a) => accounts.push(a),
                Err(e) => warn!("skipping corrupt account file {:?}: {}", path, e),
            }
        }
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    async fn write_record(path: &Path, account: &Account) -> Result<()> {
        let content = serde_json::to_string_pretty(account)?;
        Self::write_file_locked(path, &content).await
    }

    /// Write content to a file under an exclusive lock via temp file + rename
    async fn write_file_locked(path: &Path, content: &str) -> Result<()> {
        use std::fs::{File, OpenOptions};
        use std::io::Write;

        // fs2 locks are blocking; records are tiny so the sync section stays short.
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("account.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        std::fs::rename(&tmp_path, path)?;
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        drop(lock_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store(dir: &Path) -> AccountStore {
        let params = Params::new(8, 1, 1, None).unwrap();
        AccountStore::new_with_params(dir.to_str().unwrap(), Some(params))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_verify() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path()).await;
        let account = store.create_account("alice", "secret123").await.unwrap();
        assert_eq!(account.level, 1);
        assert!(account.password_hash.starts_with("$argon2id$"));

        let (found, ok) = store.verify_password("alice", "secret123").await.unwrap();
        assert!(ok);
        assert_eq!(found.unwrap().username, "alice");

        let (_, bad) = store.verify_password("alice", "wrongpass").await.unwrap();
        assert!(!bad);

        let (missing, ok) = store.verify_password("nobody", "x").await.unwrap();
        assert!(missing.is_none());
        assert!(!ok);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path()).await;
        store.create_account("alice", "secret123").await.unwrap();
        match store.create_account("alice", "other").await {
            Err(StorageError::Conflict(name)) => assert_eq!(name, "alice"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_names_are_rejected() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path()).await;
        assert!(matches!(
            store.create_account("a!", "pw").await,
            Err(StorageError::InvalidUsername(_))
        ));
    }

    #[tokio::test]
    async fn set_level_persists_and_checks_bounds() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path()).await;
        store.create_account("bob_1", "pw").await.unwrap();
        let updated = store.set_level("bob_1", 4).await.unwrap();
        assert_eq!(updated.level, 4);
        assert_eq!(store.get_account("bob_1").await.unwrap().unwrap().level, 4);

        assert!(matches!(
            store.set_level("bob_1", 0).await,
            Err(StorageError::InvalidLevel(0))
        ));
        assert!(matches!(
            store.set_level("ghost", 2).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_skips_corrupt_records() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path()).await;
        store.create_account("zed", "pw").await.unwrap();
        store.create_account("amy", "pw").await.unwrap();
        std::fs::write(tmp.path().join("accounts").join("broken.json"), "{not json").unwrap();

        let names: Vec<String> = store
            .list_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
