//! # Configuration
//!
//! Dungeon Fighter reads a single TOML file (default `dungeon.toml`). `dungeon-fighter init`
//! writes one with every default filled in.
//!
//! ## Sections
//!
//! - [`GameConfig`] - player name, welcome line, HUD toggle, optional dice seed
//! - [`AuthConfig`] - where accounts live: in-process (`local`) or an HTTP endpoint (`remote`)
//! - [`StorageConfig`] - data directory for local accounts
//! - [`LoggingConfig`] - log level and optional log files
//! - [`SecurityConfig`] - Argon2 cost parameters for password hashing
//!
//! ```toml
//! [game]
//! player_name = "Traveler"
//! welcome_message = "Dungeon Fighter terminal ready. Type HELP."
//! show_hud = true
//!
//! [auth]
//! mode = "remote"
//! endpoint = "http://localhost:8080/auth"
//! timeout_seconds = 5
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `[auth]` and `[security]` may be omitted.

use anyhow::{anyhow, Result};
use argon2::Params;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::session::READY_MESSAGE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    /// Print the ASCII HUD after every round.
    #[serde(default = "default_show_hud")]
    pub show_hud: bool,
    /// Fixed dice seed for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_player_name() -> String {
    "Traveler".to_string()
}

fn default_welcome_message() -> String {
    READY_MESSAGE.to_string()
}

fn default_show_hud() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Action endpoint for `remote` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    5
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Local,
            endpoint: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Separate file for the `security` log target (sign-ins, rejected credentials).
    #[serde(default)]
    pub security_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.player_name.trim().is_empty() {
            return Err(anyhow!("game.player_name must not be empty"));
        }
        if self.auth.mode == AuthMode::Remote
            && self
                .auth
                .endpoint
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
        {
            return Err(anyhow!("auth.endpoint is required when auth.mode = \"remote\""));
        }
        if self.auth.timeout_seconds == 0 {
            return Err(anyhow!("auth.timeout_seconds must be at least 1"));
        }
        Ok(())
    }

    /// Argon2 parameters from `[security.argon2]`; `None` keeps the library defaults.
    /// Unset fields fall back to the default value for that field.
    pub fn argon2_params(&self) -> Result<Option<Params>> {
        let Some(cfg) = self.security.as_ref().and_then(|s| s.argon2.as_ref()) else {
            return Ok(None);
        };
        if cfg.memory_kib.is_none() && cfg.time_cost.is_none() && cfg.parallelism.is_none() {
            return Ok(None);
        }
        let params = Params::new(
            cfg.memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            cfg.time_cost.unwrap_or(Params::DEFAULT_T_COST),
            cfg.parallelism.unwrap_or(Params::DEFAULT_P_COST),
            None,
        )
        .map_err(|e| anyhow!("Invalid [security.argon2] parameters: {}", e))?;
        Ok(Some(params))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig {
                player_name: default_player_name(),
                welcome_message: default_welcome_message(),
                show_hud: true,
                seed: None,
            },
            auth: AuthConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("dungeon-fighter.log".to_string()),
                security_file: None,
            },
            security: Some(SecurityConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.game.player_name, "Traveler");
        assert_eq!(
            config.game.welcome_message,
            "Dungeon Fighter terminal ready. Type HELP."
        );
        assert!(config.game.show_hud);
        assert_eq!(config.auth.mode, AuthMode::Local);
        assert_eq!(config.auth.timeout_seconds, 5);
        assert!(config.validate().is_ok());
        assert!(config.argon2_params().unwrap().is_none());
    }

    #[test]
    fn minimal_file_fills_optional_sections() {
        let text = r#"
            [game]
            [storage]
            data_dir = "/tmp/df"
            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.game.player_name, "Traveler");
        assert_eq!(config.auth.mode, AuthMode::Local);
        assert!(config.security.is_none());
        assert_eq!(config.storage.data_dir, "/tmp/df");
    }

    #[test]
    fn remote_mode_needs_endpoint() {
        let mut config = Config::default();
        config.auth.mode = AuthMode::Remote;
        assert!(config.validate().is_err());
        config.auth.endpoint = Some("http://localhost:8080/auth".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn auth_mode_parses_lowercase() {
        let auth: AuthConfig = toml::from_str("mode = \"remote\"\nendpoint = \"http://x\"").unwrap();
        assert_eq!(auth.mode, AuthMode::Remote);
        assert!(toml::from_str::<AuthConfig>("mode = \"ldap\"").is_err());
    }

    #[test]
    fn argon2_partial_override() {
        let mut config = Config::default();
        config.security = Some(SecurityConfig {
            argon2: Some(Argon2Config {
                memory_kib: Some(8),
                time_cost: Some(1),
                parallelism: None,
            }),
        });
        let params = config.argon2_params().unwrap().unwrap();
        assert_eq!(params.m_cost(), 8);
        assert_eq!(params.t_cost(), 1);
        assert_eq!(params.p_cost(), Params::DEFAULT_P_COST);
    }

    #[tokio::test]
    async fn create_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dungeon.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.game.player_name, "Traveler");
        assert_eq!(loaded.storage.data_dir, "./data");
    }
}
