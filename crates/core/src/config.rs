use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub reminder: ReminderConfig,
    pub metrics: MetricsConfig,
    pub events: EventsConfig,
    pub database: DatabaseConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            reminder: ReminderConfig::from_env(),
            metrics: MetricsConfig::from_env(),
            events: EventsConfig::from_env(),
            database: DatabaseConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  reminder:  interval={}s, batch_size={}, min_elapsed={}s",
            self.reminder.interval.as_secs(),
            self.reminder.batch_size,
            self.reminder.min_elapsed.as_secs()
        );
        tracing::info!(
            "  metrics:   enabled={}, address={}",
            self.metrics.enabled,
            self.metrics.address
        );
        tracing::info!("  events:    configured={}", self.events.is_configured());
        tracing::info!(
            "  database:  configured={}, max_connections={}",
            self.database.is_configured(),
            self.database.max_connections
        );
    }
}

// ── Reminder loop ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Tick period of the reminder loop. Must be positive.
    pub interval: Duration,
    /// Maximum entities emitted per tick.
    pub batch_size: u32,
    /// Freshness threshold: entities whose oldest evaluation is older
    /// than this are reminded.
    pub min_elapsed: Duration,
}

impl ReminderConfig {
    fn from_env() -> Self {
        Self {
            interval: Duration::from_secs(env_u64("REMINDER_INTERVAL_SECS", 3600)),
            batch_size: env_u32("REMINDER_BATCH_SIZE", 100),
            min_elapsed: Duration::from_secs(env_u64("REMINDER_MIN_ELAPSED_SECS", 3600)),
        }
    }
}

// ── Metrics ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// host:port bind address for the metrics HTTP server.
    pub address: String,
}

impl MetricsConfig {
    fn from_env() -> Self {
        Self {
            enabled: env_bool("REMINDER_METRICS_ENABLED", false),
            address: env_or("REMINDER_METRICS_ADDRESS", "127.0.0.1:9090"),
        }
    }
}

// ── Events (outbox) ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Connection string handed to the outbox publisher, opaque here.
    pub connection: String,
}

impl EventsConfig {
    fn from_env() -> Self {
        Self {
            connection: env_or("EVENTS_DATABASE_URL", ""),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.connection.is_empty()
    }
}

// ── Catalog database ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("DATABASE_URL", ""),
            max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 10),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}
