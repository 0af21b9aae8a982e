//! # Dungeon Fighter game core
//!
//! - [`combatant`] - player and enemy records with the HP formulas
//! - [`dice`] - the [`dice::Dice`] source of damage rolls (thread, seeded, scripted)
//! - [`parser`] - terminal line to [`parser::Command`]
//! - [`engine`] - one combat action plus the enemy reply, stage and level progression
//! - [`presenter`] - snapshots and animation cues pushed out to a renderer
//! - [`session`] - ties parser, engine and the account capability together
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dungeon_fighter::auth::LocalAuth;
//! use dungeon_fighter::game::{CombatEngine, GameSession, HudPresenter, Player, ThreadDice};
//! use dungeon_fighter::storage::AccountStore;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let auth = Arc::new(LocalAuth::new(AccountStore::new("data").await?));
//! let engine = CombatEngine::new(
//!     Player::default(),
//!     Box::new(ThreadDice),
//!     Box::new(HudPresenter::stdout()),
//! );
//! let mut session = GameSession::new(engine, auth);
//! println!("{}", session.execute("HIT ENEMY").await?);
//! # Ok(())
//! # }
//! ```

pub mod combatant;
pub mod dice;
pub mod engine;
pub mod parser;
pub mod presenter;
pub mod session;

pub use combatant::{Enemy, Player};
pub use dice::{Dice, ScriptedDice, SeededDice, ThreadDice};
pub use engine::{AccountProgress, CombatEngine, ProgressSink};
pub use parser::{CombatAction, Command, CommandParser};
pub use presenter::{
    Cue, CueKind, HudPresenter, NullPresenter, Presenter, RecordingPresenter, Side, Snapshot,
    Turn,
};
pub use session::GameSession;
