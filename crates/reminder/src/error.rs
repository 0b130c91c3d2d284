//! Reminder error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics server bind error: {0}")]
    MetricsBind(#[from] std::io::Error),

    #[error("reminder service is already running")]
    AlreadyRunning,

    #[error("reminder service cannot start again after stop")]
    AlreadyStopped,

    #[error("store error: {0}")]
    Store(#[from] warden_store::StoreError),

    #[error("events error: {0}")]
    Events(#[from] warden_events::EventsError),
}
