use thiserror::Error;

/// Errors that can occur in the eventing layer.
#[derive(Debug, Error)]
pub enum EventsError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("publisher is closed")]
    Closed,
}
