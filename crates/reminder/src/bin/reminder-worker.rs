//! reminder-worker — sweeps the entity catalog and emits re-evaluation
//! reminders.
//!
//! Publishes:
//! - `repo.reminder` — for each repository whose oldest rule-evaluation
//!   is older than the configured freshness threshold.
//!
//! Stateless by design: multiple replicas may run concurrently and
//! consumers must be idempotent.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use warden_core::config::{self, Config};
use warden_events::PgOutboxPublisher;
use warden_reminder::ReminderService;
use warden_store::PgCatalogStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Warden reminder worker — freshness sweeps over the entity catalog.
#[derive(Parser, Debug)]
#[command(name = "reminder-worker", version, about)]
struct Cli {
    /// Tick interval in seconds (overrides REMINDER_INTERVAL_SECS).
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum entities per tick (overrides REMINDER_BATCH_SIZE).
    #[arg(long)]
    batch_size: Option<u32>,

    /// Freshness threshold in seconds (overrides REMINDER_MIN_ELAPSED_SECS).
    #[arg(long)]
    min_elapsed: Option<u64>,

    /// Metrics bind address (overrides REMINDER_METRICS_ADDRESS).
    #[arg(long)]
    metrics_address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(secs) = cli.interval {
        config.reminder.interval = Duration::from_secs(secs);
    }
    if let Some(batch_size) = cli.batch_size {
        config.reminder.batch_size = batch_size;
    }
    if let Some(secs) = cli.min_elapsed {
        config.reminder.min_elapsed = Duration::from_secs(secs);
    }
    if let Some(address) = cli.metrics_address {
        config.metrics.address = address;
    }
    config.log_summary();

    let store = PgCatalogStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to the catalog database")?;
    let publisher = PgOutboxPublisher::connect(&config.events.connection)
        .await
        .context("failed to connect to the events outbox")?;

    let service = Arc::new(ReminderService::new(
        config.reminder,
        config.metrics,
        Arc::new(store),
        Arc::new(publisher),
    ));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = cancel_tx.send(true);
    });

    info!("reminder-worker starting");
    service
        .start(cancel_rx)
        .await
        .context("reminder service failed")?;
    info!("reminder-worker exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c");
    }
}
