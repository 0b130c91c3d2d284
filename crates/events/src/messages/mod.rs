//! Typed event payloads and topic constants.

pub mod events;
pub mod topics;
