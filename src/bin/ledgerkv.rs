//! LedgerKV Binary
//!
//! Replays the log, then serves commands from stdin until EXIT or EOF.

use std::io;

use clap::Parser;
use ledgerkv::config::WalSyncStrategy;
use ledgerkv::shell::{Session, SystemClock};
use ledgerkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// LedgerKV
#[derive(Parser, Debug)]
#[command(name = "ledgerkv")]
#[command(about = "Persistent key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./ledgerkv_data")]
    data_dir: String,

    /// Sync the log every N records instead of after each one
    #[arg(long)]
    sync_every: Option<usize>,
}

fn main() {
    // Logs go to stderr; stdout carries replies only.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ledgerkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("LedgerKV v{}", ledgerkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let sync_strategy = match args.sync_every {
        Some(count) => WalSyncStrategy::EveryNEntries { count },
        None => WalSyncStrategy::EveryWrite,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_sync_strategy(sync_strategy)
        .build();

    // Replay must finish before the first command is read.
    let mut engine = match Engine::open(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = Session::new(&mut engine, SystemClock).run(stdin.lock(), &mut out);
    match outcome {
        Ok(stats) => tracing::info!(
            commands = stats.commands,
            errors = stats.errors,
            writes = stats.writes,
            "session finished"
        ),
        Err(e) => tracing::error!("Session error: {}", e),
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        std::process::exit(1);
    }
}
