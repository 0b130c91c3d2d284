use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WardenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Repository,
    Artifact,
    PullRequest,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Repository => write!(f, "repository"),
            EntityType::Artifact => write!(f, "artifact"),
            EntityType::PullRequest => write!(f, "pull_request"),
        }
    }
}

impl FromStr for EntityType {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repository" => Ok(EntityType::Repository),
            "artifact" => Ok(EntityType::Artifact),
            "pull_request" => Ok(EntityType::PullRequest),
            other => Err(WardenError::UnknownEntityType(other.to_string())),
        }
    }
}

/// A registered object subject to periodic policy evaluation.
///
/// Entity ids are UUIDs and order lexicographically; catalog iteration
/// relies on `id > cursor` semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub project_id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
}

/// The age of an entity's oldest rule evaluation, derived server-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OldestEvaluation {
    pub entity_id: Uuid,
    pub oldest_last_updated: DateTime<Utc>,
}
