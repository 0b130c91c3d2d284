//! Topic constants for message routing.
//!
//! The wire names here are what downstream consumers subscribe to; they
//! are stable contracts and must not change without a migration plan.

/// Asks the evaluation pipeline to re-evaluate a repository whose
/// freshness budget has elapsed.
pub const REPO_REMINDER: &str = "repo.reminder";
