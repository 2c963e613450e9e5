//! # TillQuest Register Library
//!
//! The terminal register: configuration, shop state, the command surface and
//! the prompt loop that drives it.
//!
//! ## Module Organization
//! ```text
//! tillquest_register/
//! ├── lib.rs          ◄─── You are here (startup & prompt loop)
//! ├── cli.rs          ◄─── Startup flags, prompt grammar, dispatch
//! ├── config.rs       ◄─── AppConfig (defaults → file → env)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   └── shop.rs     ◄─── Every store + the cart behind one Mutex
//! ├── commands/
//! │   ├── inventory.rs◄─── Scan and stock commands
//! │   ├── cart.rs     ◄─── Cart and checkout commands
//! │   ├── sales.rs    ◄─── Sales history commands
//! │   ├── wallet.rs   ◄─── Persona and wallet commands
//! │   ├── payment.rs  ◄─── Payment handshake commands
//! │   ├── progress.rs ◄─── Game profile and theme commands
//! │   └── system.rs   ◄─── Full reset
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::error::Error;

use chrono::Local;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use tillquest_db::{Database, DbConfig, KvStore};

use cli::{Args, Command, Line};
use config::AppConfig;
use state::{RegisterState, ShopState};

/// Runs the register until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults → config.toml → TILLQUEST_* env → command-line flags     │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • RUST_LOG wins, else the configured filter                         │
/// │                                                                         │
/// │  3. Connect to Databases ─────────────────────────────────────────────► │
/// │     • Shop database, migrations applied                                 │
/// │     • Channel database if configured, else the shop database            │
/// │                                                                         │
/// │  4. Open the Shop ────────────────────────────────────────────────────► │
/// │     • Load every store, run the daily streak check                      │
/// │                                                                         │
/// │  5. Prompt Loop ──────────────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::load_or_default(args.config);
    if let Some(db) = args.db {
        config.database_path = db;
    }
    if let Some(channel) = args.channel {
        config.channel_path = Some(channel);
    }

    init_tracing(&config.log_filter);
    info!(store = %config.store_name, "Starting TillQuest register");

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let channel_db = match &config.channel_path {
        Some(path) => Database::new(DbConfig::new(path)).await?,
        None => db.clone(),
    };
    info!(
        db = %config.database_path.display(),
        shared_channel = config.channel_path.is_some(),
        "Databases connected"
    );

    let state: RegisterState =
        ShopState::open(db.kv(), channel_db.kv(), config.welcome_credit()).await?;

    match state.start_session(Local::now().date_naive()).await {
        Ok(report) if !report.is_empty() => {
            info!(coins = report.coins_earned, unlocked = ?report.unlocked, "Daily bonus");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Daily streak check failed"),
    }

    prompt_loop(&state, &config.store_name).await?;

    db.close().await;
    if config.channel_path.is_some() {
        channel_db.close().await;
    }
    info!("Register closed");
    Ok(())
}

/// Reads commands from stdin until `quit` or end of input.
async fn prompt_loop<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    store_name: &str,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(format!("{}> ", store_name).as_bytes()).await?;
        stdout.flush().await?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        let words = cli::split_args(&input);
        if words.is_empty() {
            continue;
        }

        let reply = match Line::try_parse_from(words) {
            Ok(Line {
                command: Command::Quit,
            }) => break,
            Ok(line) => match cli::dispatch(state, line.command).await {
                Ok(out) => out,
                Err(e) => e.to_string(),
            },
            // Also carries `help` output.
            Err(e) => e.render().to_string(),
        };

        stdout.write_all(reply.trim_end().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tillquest_db=trace` - Show trace for the store crate only
/// - Default: the configured `log_filter`
///
/// Logs go to stderr so they never interleave with command replies.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .try_init();
}
