//! Account name validation and filesystem-safety helpers for the account store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Shortest accepted account name.
pub const USERNAME_MIN: usize = 3;
/// Longest accepted account name.
pub const USERNAME_MAX: usize = 24;

/// Account name validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("Username is required")]
    Empty,

    #[error("Username is too short (minimum {min} characters)")]
    TooShort { min: usize },

    #[error("Username is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Username contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// File size exceeds maximum allowed
    FileSizeExceeded { limit: usize },

    /// Path escapes the data directory
    InvalidPath,

    /// JSON format is invalid or malformed
    InvalidFormat,
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::FileSizeExceeded { limit } => {
                write!(f, "File size exceeds limit ({} bytes)", limit)
            }
            SecurityError::InvalidPath => write!(f, "Invalid path or path traversal attempt"),
            SecurityError::InvalidFormat => write!(f, "Invalid format"),
        }
    }
}

impl std::error::Error for SecurityError {}

/// Validate an account name against `^[A-Za-z0-9_]{3,24}$`.
///
/// The name is checked as given; callers trim beforehand if they accept padded input.
pub fn validate_account_name(name: &str) -> Result<&str, UsernameError> {
    if name.is_empty() {
        return Err(UsernameError::Empty);
    }

    let invalid: BTreeSet<char> = name
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        .collect();
    if !invalid.is_empty() {
        return Err(UsernameError::InvalidCharacters {
            chars: invalid.into_iter().collect(),
        });
    }

    // ASCII only from here, so byte length equals char count
    if name.len() < USERNAME_MIN {
        return Err(UsernameError::TooShort { min: USERNAME_MIN });
    }
    if name.len() > USERNAME_MAX {
        return Err(UsernameError::TooLong { max: USERNAME_MAX });
    }

    Ok(name)
}

/// Generate safe filename from an account name using URL encoding
pub fn safe_filename(username: &str) -> String {
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
    utf8_percent_encode(username, NON_ALPHANUMERIC).to_string()
}

/// Path of the JSON record for `username` under `<data_dir>/accounts/`.
pub fn secure_account_path(data_dir: &str, username: &str) -> Result<PathBuf, SecurityError> {
    let base = Path::new(data_dir).join("accounts");
    let path = base.join(format!("{}.json", safe_filename(username)));

    // Percent-encoding removes separators, but keep the containment check explicit
    if path.parent() != Some(base.as_path()) {
        return Err(SecurityError::InvalidPath);
    }

    Ok(path)
}

/// Validate file size before reading
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), SecurityError> {
    if size > max_size {
        return Err(SecurityError::FileSizeExceeded {
            limit: max_size as usize,
        });
    }
    Ok(())
}

/// Securely parse JSON with size limits and error handling
pub fn secure_json_parse<T>(content: &str, max_bytes: usize) -> Result<T, SecurityError>
where
    T: serde::de::DeserializeOwned,
{
    if content.len() > max_bytes {
        return Err(SecurityError::FileSizeExceeded { limit: max_bytes });
    }

    // Interrupted writes have been seen to leave leading NULs; valid JSON never starts with one.
    let normalized = content.trim_start_matches('\0');

    serde_json::from_str(normalized).map_err(|_| SecurityError::InvalidFormat)
}
