//! Stateless reminder scheduler for the warden platform.
//!
//! Sweeps the entity catalog in bounded-memory batches and emits a
//! reminder message for each repository whose oldest rule-evaluation is
//! older than the configured freshness threshold. Downstream consumers
//! pick the messages up and re-evaluate the entity.
//!
//! The scheduler keeps no durable state of its own: the pagination
//! cursor lives in memory and starts at a random position so concurrent
//! replicas scatter across the catalog instead of sweeping in lockstep.
//! Consumers must be idempotent — replicas will occasionally remind the
//! same repository twice within one freshness window.

pub mod cursor;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod service;

pub use cursor::Cursor;
pub use error::ReminderError;
pub use fetcher::{fetch_batch, FetchedBatch};
pub use filter::filter_eligible;
pub use metrics::{MetricsServer, ReminderMetrics};
pub use service::ReminderService;

#[cfg(test)]
pub(crate) mod testing;
