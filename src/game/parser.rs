//! Terminal command parser.
//!
//! Keywords are matched case-insensitively; REGISTER / LOGIN arguments keep their original
//! case. Argument presence is not checked here: `REGISTER alice` still parses as
//! [`Command::Register`] with `password: None`, and the session answers with usage text.
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    Hit,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Help,
    Status,
    Register {
        username: Option<String>,
        password: Option<String>,
    },
    Login {
        username: Option<String>,
        password: Option<String>,
    },
    Combat(CombatAction),
    Unknown,
}

pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> Command {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Command::Empty;
        };
        let keyword = first.to_ascii_uppercase();
        let second = tokens.get(1).map(|t| t.to_ascii_uppercase());
        let arg = |i: usize| tokens.get(i).map(|t| t.to_string());

        let cmd = match keyword.as_str() {
            "HELP" => Command::Help,
            "STATUS" => Command::Status,
            "REGISTER" => Command::Register {
                username: arg(1),
                password: arg(2),
            },
            "LOGIN" => Command::Login {
                username: arg(1),
                password: arg(2),
            },
            "HIT" if second.as_deref() == Some("ENEMY") => Command::Combat(CombatAction::Hit),
            "BLOCK" => Command::Combat(CombatAction::Block),
            _ => Command::Unknown,
        };
        trace!("parsed {:?} as {}", keyword, cmd.label());
        cmd
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Command {
    /// Short name for logs; never includes arguments.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Empty => "EMPTY",
            Command::Help => "HELP",
            Command::Status => "STATUS",
            Command::Register { .. } => "REGISTER",
            Command::Login { .. } => "LOGIN",
            Command::Combat(CombatAction::Hit) => "HIT",
            Command::Combat(CombatAction::Block) => "BLOCK",
            Command::Unknown => "UNKNOWN",
        }
    }
}
