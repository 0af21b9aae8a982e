//! # Dungeon Fighter - turn-based terminal combat with persistent accounts
//!
//! The player types commands into a terminal, fights an endless ladder of dungeon foes, and
//! (optionally) registers an account so the reached level survives between sessions.
//!
//! ## Features
//!
//! - **Command Terminal**: `HELP`, `STATUS`, `REGISTER`, `LOGIN`, `HIT ENEMY`, `BLOCK`, matched case-insensitively.
//! - **Combat Engine**: Player action and enemy reply resolved in one step, with injectable dice.
//! - **Progression**: Each victory opens the next stage; reaching a new stage raises the level and saves it.
//! - **Accounts**: Local file-backed store with Argon2id hashes, or a remote HTTP endpoint speaking the same JSON actions.
//! - **HUD**: Optional one-line ASCII health bars after every round.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dungeon_fighter::auth::LocalAuth;
//! use dungeon_fighter::game::{CombatEngine, GameSession, NullPresenter, Player, SeededDice};
//! use dungeon_fighter::storage::AccountStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = AccountStore::new("./data").await?;
//!     let engine = CombatEngine::new(
//!         Player::default(),
//!         Box::new(SeededDice::new(7)),
//!         Box::new(NullPresenter),
//!     );
//!     let mut session = GameSession::new(engine, Arc::new(LocalAuth::new(store)));
//!
//!     println!("{}", session.execute("REGISTER alice secret1").await?);
//!     println!("{}", session.execute("HIT ENEMY").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - parser, combat engine, presenter port, and the terminal session
//! - [`auth`] - account capability trait, local backend, remote HTTP client, JSON action protocol
//! - [`storage`] - file-based account records
//! - [`config`] - TOML configuration
//! - [`errors`] - storage and game error types
//! - [`validation`] - username rules and safe file paths
//! - [`logutil`] - log escaping and credential redaction
//! - [`metrics`] - process-wide counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  GameSession    │ ← parse, dispatch, text replies
//! └─────────────────┘
//!     │         │
//! ┌────────┐ ┌─────────────┐
//! │ Combat │ │ AuthService │ ← LocalAuth (AccountStore) or HttpAuth
//! │ Engine │ └─────────────┘
//! └────────┘
//!     │
//! ┌─────────────────┐
//! │   Presenter     │ ← HUD / recording / null
//! └─────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod errors;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod storage;
pub mod validation;
