//! Binary entrypoint for the Dungeon Fighter terminal.
//!
//! Commands:
//! - `play [--seed <n>]` - read commands from stdin and print results until EOF
//! - `init` - write a starter `dungeon.toml` and create the data directory
//! - `accounts` - list locally stored accounts
//!
//! See the library crate docs for module-level details: `dungeon_fighter::`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use dungeon_fighter::auth::{AuthService, LocalAuth};
use dungeon_fighter::config::{AuthMode, Config};
use dungeon_fighter::game::{
    CombatEngine, Dice, GameSession, HudPresenter, NullPresenter, Player, Presenter, SeededDice,
    ThreadDice,
};
use dungeon_fighter::metrics;
use dungeon_fighter::storage::AccountStore;

#[derive(Parser)]
#[command(name = "dungeon-fighter")]
#[command(about = "Turn-based dungeon combat in your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "dungeon.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session on stdin/stdout
    Play {
        /// Seed the dice for a reproducible run (overrides game.seed)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a default configuration file
    Init,
    /// List stored accounts
    Accounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { seed } => {
            // A missing config file is fine for play: run on defaults.
            let config = if tokio::fs::metadata(&cli.config).await.is_ok() {
                Config::load(&cli.config).await?
            } else {
                Config::default()
            };
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting Dungeon Fighter v{}", env!("CARGO_PKG_VERSION"));
            play(config, seed).await?;
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new Dungeon Fighter configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let cfg = Config::default();
            let store = AccountStore::new(&cfg.storage.data_dir).await?;
            info!("Account storage ready at {}/accounts", store.base_dir());
            println!("Created {} and {}", cli.config, cfg.storage.data_dir);
        }
        Commands::Accounts => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = AccountStore::new(&config.storage.data_dir).await?;
            let accounts = store.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts.");
            }
            for account in accounts {
                println!(
                    "{} {} {}",
                    account.username,
                    account.level,
                    account.created_at.format("%Y-%m-%dT%H:%M:%SZ")
                );
            }
        }
    }

    Ok(())
}

async fn build_auth(config: &Config) -> Result<Arc<dyn AuthService>> {
    match config.auth.mode {
        AuthMode::Local => {
            let store =
                AccountStore::new_with_params(&config.storage.data_dir, config.argon2_params()?)
                    .await?;
            info!("Using local accounts in {}", store.base_dir());
            Ok(Arc::new(LocalAuth::new(store)))
        }
        #[cfg(feature = "remote")]
        AuthMode::Remote => {
            let endpoint = config
                .auth
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow!("auth.endpoint is required for remote mode"))?;
            info!("Using remote accounts at {}", endpoint);
            Ok(Arc::new(dungeon_fighter::auth::HttpAuth::new(
                endpoint,
                config.auth.timeout_seconds,
            )))
        }
        #[cfg(not(feature = "remote"))]
        AuthMode::Remote => Err(anyhow!(
            "auth.mode = \"remote\" requires the 'remote' feature"
        )),
    }
}

async fn play(config: Config, seed: Option<u64>) -> Result<()> {
    let auth = build_auth(&config).await?;
    let dice: Box<dyn Dice> = match seed.or(config.game.seed) {
        Some(seed) => {
            info!("Dice seeded with {}", seed);
            Box::new(SeededDice::new(seed))
        }
        None => Box::new(ThreadDice),
    };
    let presenter: Box<dyn Presenter> = if config.game.show_hud {
        Box::new(HudPresenter::stdout())
    } else {
        Box::new(NullPresenter)
    };
    let engine = CombatEngine::new(Player::new(config.game.player_name.clone()), dice, presenter);
    let mut session = GameSession::new(engine, auth);

    println!("{}", config.game.welcome_message);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        println!("> {}", input);
        match session.execute(input).await {
            Ok(text) => {
                for out in text.lines() {
                    println!("{}", out);
                }
            }
            Err(e) => println!("ERROR: {}", e),
        }
    }

    drop(session);
    debug!("session ended: {}", metrics::snapshot().summary());
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // stdout carries the game; only mirror logs to an interactive stderr when asked for
            let mirror = verbosity > 0 && atty::is(atty::Stream::Stderr);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    if let Some(ref sec_path) = security_path {
                        if let Ok(mut sf) = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(sec_path)
                        {
                            let _ = writeln!(sf, "{}", line);
                        }
                    }
                }

                if mirror {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    }
    let _ = builder.try_init();
}
