//! Durable eventing layer for the warden platform.
//!
//! Components communicate through topic-addressed [`Message`]s. The
//! [`EventPublisher`] trait is the seam producers write against;
//! [`PgOutboxPublisher`] implements it with a transactional PostgreSQL
//! outbox, giving at-least-once delivery once a downstream relay drains
//! the outbox table.

pub mod error;
pub mod message;
pub mod messages;
pub mod outbox;
pub mod traits;

pub use error::EventsError;
pub use message::Message;
pub use messages::events;
pub use messages::topics;
pub use outbox::PgOutboxPublisher;
pub use traits::EventPublisher;
