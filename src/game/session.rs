//! Terminal session: one line of input in, one block of text out.
//!
//! The session owns the combat engine, remembers who is signed in, and routes account
//! commands to the [`AuthService`]. Every command answers with text; the only error that
//! leaves [`GameSession::execute`] is a rejected or unreachable REGISTER / LOGIN, which the
//! terminal prints as `ERROR: <message>`.

use std::sync::Arc;

use log::{debug, info};

use super::engine::{AccountProgress, CombatEngine, ProgressSink};
use super::parser::{CombatAction, Command, CommandParser};
use crate::auth::{AccountView, AuthError, AuthService, Credentials};
use crate::errors::GameError;
use crate::logutil::{escape_log, redact_credentials};
use crate::metrics;

pub const READY_MESSAGE: &str = "Dungeon Fighter terminal ready. Type HELP.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type HELP.";
pub const REGISTER_USAGE: &str = "Usage: REGISTER <username> <password>";
pub const LOGIN_USAGE: &str = "Usage: LOGIN <username> <password>";

const HELP_LINES: [&str; 7] = [
    "Available commands:",
    "HELP",
    "STATUS",
    "REGISTER <username> <password>",
    "LOGIN <username> <password>",
    "HIT ENEMY",
    "BLOCK",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignIn {
    Register,
    Login,
}

pub struct GameSession {
    engine: CombatEngine,
    auth: Arc<dyn AuthService>,
    parser: CommandParser,
    current_user: Option<String>,
}

impl GameSession {
    pub fn new(engine: CombatEngine, auth: Arc<dyn AuthService>) -> Self {
        metrics::record_session_entry();
        GameSession {
            engine,
            auth,
            parser: CommandParser::new(),
            current_user: None,
        }
    }

    pub fn engine(&self) -> &CombatEngine {
        &self.engine
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn help_text(&self) -> String {
        HELP_LINES.join("\n")
    }

    pub fn status_text(&self) -> String {
        let player = self.engine.player();
        let enemy = self.engine.enemy();
        let login = match &self.current_user {
            Some(user) => format!("Logged as {}", user),
            None => "Not logged in".to_string(),
        };
        format!(
            "Player: {} | {} | HP: {}/{} | Level: {} | Dungeon stage: {} | Enemy HP: {}/{}",
            player.name,
            login,
            player.hp,
            player.max_hp,
            player.level,
            player.stage,
            enemy.hp,
            enemy.max_hp
        )
    }

    /// Run one raw terminal line. Blank input yields an empty string.
    pub async fn execute(&mut self, raw: &str) -> Result<String, AuthError> {
        let command = self.parser.parse(raw);
        if command != Command::Empty {
            debug!("input: {}", escape_log(&redact_credentials(raw)));
        }
        match self.dispatch(command).await {
            Ok(text) => Ok(text),
            Err(GameError::Auth(e)) => {
                info!("account command failed: {}", e);
                Err(e)
            }
            Err(other) => Ok(other.to_string()),
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<String, GameError> {
        match command {
            Command::Empty => Ok(String::new()),
            Command::Help => Ok(self.help_text()),
            Command::Status => Ok(self.status_text()),
            Command::Register { username, password } => {
                let credentials = require_credentials(username, password, REGISTER_USAGE)?;
                self.sign_in(SignIn::Register, credentials).await
            }
            Command::Login { username, password } => {
                let credentials = require_credentials(username, password, LOGIN_USAGE)?;
                self.sign_in(SignIn::Login, credentials).await
            }
            Command::Combat(action) => Ok(self.fight(action).await),
            Command::Unknown => Err(GameError::Protocol(UNKNOWN_COMMAND.to_string())),
        }
    }

    async fn sign_in(
        &mut self,
        mode: SignIn,
        credentials: Credentials,
    ) -> Result<String, GameError> {
        let AccountView { username, level } = match mode {
            SignIn::Register => self.auth.register(&credentials).await?,
            SignIn::Login => self.auth.login(&credentials).await?,
        };
        let (reply, status) = match mode {
            SignIn::Register => (
                format!("Registered and logged in as {}.", username),
                "Registration successful. Enter combat commands.".to_string(),
            ),
            SignIn::Login => (
                format!("Login successful. Loaded level {}.", level),
                format!("Welcome back, {}.", username),
            ),
        };
        info!(target: "security", "signed in as {}", escape_log(&username));
        self.engine.load_progress(level, &status);
        self.current_user = Some(username);
        Ok(reply)
    }

    async fn fight(&mut self, action: CombatAction) -> String {
        let progress = self.current_user.as_deref().map(|username| AccountProgress {
            auth: self.auth.as_ref(),
            username,
        });
        let sink = progress.as_ref().map(|p| p as &dyn ProgressSink);
        self.engine.perform(action, sink).await
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        metrics::record_session_exit();
    }
}

fn require_credentials(
    username: Option<String>,
    password: Option<String>,
    usage: &str,
) -> Result<Credentials, GameError> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok(Credentials::new(u, p)),
        _ => Err(GameError::Validation(usage.to_string())),
    }
}
