use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EventsError;
use crate::message::Message;

/// Durably enqueues messages for downstream consumers.
///
/// A successful [`publish_batch`](EventPublisher::publish_batch) means
/// every message in the batch is durably enqueued (at-least-once from
/// there on; consumers must be idempotent).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a batch atomically: either all messages are enqueued or
    /// none are.
    async fn publish_batch(&self, messages: &[Message]) -> Result<(), EventsError>;

    /// Release the underlying connection. Idempotent: second and later
    /// calls return `Ok` without effect.
    async fn close(&self) -> Result<(), EventsError>;
}

/// Blanket implementation so `Arc<dyn EventPublisher>` can be used directly.
#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish_batch(&self, messages: &[Message]) -> Result<(), EventsError> {
        (**self).publish_batch(messages).await
    }

    async fn close(&self) -> Result<(), EventsError> {
        (**self).close().await
    }
}
