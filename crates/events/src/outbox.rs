//! Transactional PostgreSQL outbox publisher.
//!
//! Messages are inserted into `message_outbox` inside a single
//! transaction; a downstream relay drains the table and forwards to the
//! actual transport. The schema is created on connect so fresh
//! environments need no migration step.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::EventsError;
use crate::message::Message;
use crate::traits::EventPublisher;

const OUTBOX_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS message_outbox (
    id UUID PRIMARY KEY,
    topic TEXT NOT NULL,
    payload JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    delivered_at TIMESTAMPTZ
)";

const OUTBOX_PENDING_INDEX: &str = "\
CREATE INDEX IF NOT EXISTS message_outbox_pending_idx
    ON message_outbox (created_at)
    WHERE delivered_at IS NULL";

/// [`EventPublisher`] backed by a PostgreSQL outbox table.
pub struct PgOutboxPublisher {
    pool: PgPool,
    closed: AtomicBool,
}

impl PgOutboxPublisher {
    /// Connect to the events database and initialize the outbox schema.
    pub async fn connect(url: &str) -> Result<Self, EventsError> {
        let pool = PgPoolOptions::new().max_connections(4).connect(url).await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool, initializing the outbox schema.
    pub async fn with_pool(pool: PgPool) -> Result<Self, EventsError> {
        sqlx::query(OUTBOX_SCHEMA).execute(&pool).await?;
        sqlx::query(OUTBOX_PENDING_INDEX).execute(&pool).await?;
        info!("message outbox schema ready");
        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl EventPublisher for PgOutboxPublisher {
    async fn publish_batch(&self, messages: &[Message]) -> Result<(), EventsError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EventsError::Closed);
        }
        if messages.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for message in messages {
            let payload: serde_json::Value = serde_json::from_slice(&message.payload)?;
            sqlx::query(
                "INSERT INTO message_outbox (id, topic, payload, created_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(message.id)
            .bind(&message.topic)
            .bind(payload)
            .bind(message.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(count = messages.len(), "enqueued outbox batch");
        Ok(())
    }

    async fn close(&self) -> Result<(), EventsError> {
        // One-shot guard: only the first call tears the pool down.
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.pool.close().await;
        info!("outbox publisher closed");
        Ok(())
    }
}
