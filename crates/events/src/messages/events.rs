//! Typed event payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::Entity;

/// Payload of a [`topics::REPO_REMINDER`](super::topics::REPO_REMINDER)
/// message.
///
/// Field declaration order is the wire order:
/// `{"project":…,"provider":…,"entity_id":…}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoReminder {
    pub project: Uuid,
    pub provider: Uuid,
    pub entity_id: Uuid,
}

impl RepoReminder {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            project: entity.project_id,
            provider: entity.provider_id,
            entity_id: entity.id,
        }
    }
}
