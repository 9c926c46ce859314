//! # pulse
//!
//! Inspect the persisted session ledger and replay scripted timelines
//! through a session tracker.

#![deny(unsafe_code)]

mod simulate;

use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use pulse_core::clock::{ManualClock, SystemClock, WallClock};
use pulse_engine::{RecordingSink, SessionTracker, TrackerConfig};
use pulse_settings::PulseSettings;
use pulse_store::{Database, KeyValueStore, SessionLedger, SqliteStore};
use pulse_telemetry::{init_telemetry, TelemetryConfig};

/// Modules raised to debug by `--verbose`.
const VERBOSE_MODULES: [&str; 2] = ["pulse_engine", "pulse_store"];

/// Session windowing toolbox.
#[derive(Parser, Debug)]
#[command(name = "pulse", version, about = "Session windowing toolbox")]
struct Cli {
    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Settings file (defaults to `~/.pulse/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log engine and store activity at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or reset the persisted session ledger.
    #[command(subcommand)]
    Ledger(LedgerCommand),

    /// Replay a step script through a tracker and print each delivered log
    /// as a JSON line.
    Simulate {
        /// Script file; reads stdin when omitted.
        script: Option<PathBuf>,

        /// Wall-clock start in epoch milliseconds (defaults to now).
        #[arg(long)]
        start: Option<u64>,

        /// Group the logs are enqueued under.
        #[arg(long, default_value = "simulation")]
        group: String,

        /// Use a throwaway in-memory ledger instead of the database.
        #[arg(long)]
        in_memory: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// List persisted session boundaries, oldest first.
    Show,
    /// Print the session covering a wall-clock instant.
    Find {
        /// Epoch milliseconds.
        #[arg(long)]
        at: i64,
    },
    /// Remove every persisted session boundary.
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => pulse_settings::load_settings_from_path(path),
        None => pulse_settings::load_settings(),
    }
    .context("failed to load settings")?;

    let telemetry = init_telemetry(telemetry_config(&settings));
    if cli.verbose {
        if telemetry.is_installed() {
            for module in VERBOSE_MODULES {
                telemetry.set_module_level(module, Level::DEBUG);
            }
        } else {
            eprintln!("--verbose ignored: logging is configured elsewhere");
        }
    }
    tracing::debug!(?settings, "settings loaded");

    let config = TrackerConfig::from_settings(&settings)?;
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| pulse_settings::resolve_db_path(&settings));

    match cli.command {
        Command::Ledger(command) => run_ledger(command, &config, &db_path),
        Command::Simulate {
            script,
            start,
            group,
            in_memory,
        } => {
            let store: Arc<dyn KeyValueStore> = if in_memory {
                Arc::new(pulse_store::MemoryStore::new())
            } else {
                open_store(&db_path)?
            };
            run_simulation(script, start, &group, config, store)
        }
    }
}

fn telemetry_config(settings: &PulseSettings) -> TelemetryConfig {
    let log_level = Level::from_str(&settings.logging.level).unwrap_or(Level::INFO);
    let module_levels = settings
        .logging
        .modules
        .iter()
        .filter_map(|(module, level)| {
            Level::from_str(level)
                .ok()
                .map(|level| (module.clone(), level))
        })
        .collect();
    TelemetryConfig {
        log_level,
        module_levels,
        json: settings.logging.json,
    }
}

fn open_store(path: &std::path::Path) -> Result<Arc<dyn KeyValueStore>> {
    let db = Database::open(path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    Ok(Arc::new(SqliteStore::new(db)))
}

fn run_ledger(
    command: LedgerCommand,
    config: &TrackerConfig,
    db_path: &std::path::Path,
) -> Result<()> {
    let store = open_store(db_path)?;
    let mut ledger = SessionLedger::load(
        store,
        config.storage_key.clone(),
        config.max_stored_sessions,
    )?;

    match command {
        LedgerCommand::Show => {
            for session in ledger.sessions() {
                println!("{}", serde_json::to_string(&session)?);
            }
            eprintln!("{}", ledger_summary(&ledger));
        }
        LedgerCommand::Find { at } => match ledger.find_covering_session(at) {
            Some(session) => println!("{}", serde_json::to_string(&session)?),
            None => eprintln!("no session covers {at}"),
        },
        LedgerCommand::Clear => {
            let removed = ledger.len();
            ledger.clear()?;
            eprintln!("removed {removed} session(s)");
        }
    }
    Ok(())
}

/// One-line overview such as `2/5 sessions under "sessions", latest 1000/<id>`.
fn ledger_summary(ledger: &SessionLedger) -> String {
    let latest = ledger
        .latest()
        .map_or_else(|| "none".to_string(), |session| session.to_token());
    format!(
        "{}/{} sessions under {:?}, latest {latest}",
        ledger.len(),
        ledger.capacity(),
        ledger.key()
    )
}

fn run_simulation(
    script: Option<PathBuf>,
    start: Option<u64>,
    group: &str,
    config: TrackerConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<()> {
    let text = match &script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read script from stdin")?;
            text
        }
    };
    let steps = simulate::parse_script(&text)?;

    let start = match start {
        Some(ms) => ms,
        None => u64::try_from(SystemClock::new().now_ms()).context("clock before epoch")?,
    };
    let clock = Arc::new(ManualClock::new(start));
    let sink = Arc::new(RecordingSink::new());
    let tracker = SessionTracker::open(config, clock.clone(), sink.clone(), store)?;

    for log in simulate::run(&steps, &tracker, &clock, &sink, group)? {
        println!("{}", serde_json::to_string(&log)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pulse_core::session::Session;
    use pulse_store::MemoryStore;

    #[test]
    fn summary_of_empty_ledger() {
        let ledger = SessionLedger::load(Arc::new(MemoryStore::new()), "sessions", 5).unwrap();
        assert_eq!(ledger_summary(&ledger), "0/5 sessions under \"sessions\", latest none");
    }

    #[test]
    fn summary_names_latest_session() {
        let mut ledger = SessionLedger::load(Arc::new(MemoryStore::new()), "visits", 3).unwrap();
        let first = Session::new(Default::default(), 1_000);
        let second = Session::new(Default::default(), 2_000);
        ledger.record(first).unwrap();
        ledger.record(second).unwrap();

        assert_eq!(
            ledger_summary(&ledger),
            format!("2/3 sessions under \"visits\", latest {}", second.to_token())
        );
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["pulse", "ledger", "show", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Ledger(LedgerCommand::Show)));
    }
}
