//! Catalog store trait.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::{Entity, EntityType, OldestEvaluation};

use crate::error::StoreError;

/// Read access to the entity catalog and its evaluation history.
///
/// Implementations handle the specifics of a particular backing store;
/// the reminder core only depends on these three operations.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List entities of the given type with `id > after`, ascending by id,
    /// capped at `limit`. A nil `after` means "from the start".
    async fn list_entities_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
        limit: u32,
    ) -> Result<Vec<Entity>, StoreError>;

    /// Cheap existence probe: is there any entity of the given type with
    /// `id > after`? Used to detect end-of-catalog without an extra row read.
    async fn entity_exists_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
    ) -> Result<bool, StoreError>;

    /// Oldest rule-evaluation timestamp per entity.
    ///
    /// Entities that have never been evaluated are omitted from the result.
    async fn oldest_rule_evaluations(
        &self,
        entity_ids: &[Uuid],
    ) -> Result<Vec<OldestEvaluation>, StoreError>;
}

/// Blanket implementation so `Arc<dyn CatalogStore>` can be used directly.
#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    async fn list_entities_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
        limit: u32,
    ) -> Result<Vec<Entity>, StoreError> {
        (**self).list_entities_after(entity_type, after, limit).await
    }

    async fn entity_exists_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
    ) -> Result<bool, StoreError> {
        (**self).entity_exists_after(entity_type, after).await
    }

    async fn oldest_rule_evaluations(
        &self,
        entity_ids: &[Uuid],
    ) -> Result<Vec<OldestEvaluation>, StoreError> {
        (**self).oldest_rule_evaluations(entity_ids).await
    }
}
