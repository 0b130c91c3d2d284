use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire-format message envelope for inter-component communication.
///
/// Payloads are canonical JSON so consumers in any language can parse
/// them tolerantly; field order on the wire is the payload struct's
/// declaration order. The `id` is the bus-level message identity, fresh
/// for every message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Bus-level message identity (fresh random v4 per message).
    pub id: Uuid,

    /// Routing topic (e.g. "repo.reminder").
    pub topic: String,

    /// JSON-encoded payload bytes.
    pub payload: Vec<u8>,

    /// When this message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message, serializing the payload as JSON.
    pub fn new<T: Serialize>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            payload: serde_json::to_vec(payload)?,
            timestamp: Utc::now(),
        })
    }

    /// Deserialize the payload into the expected type.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
