//! PostgreSQL catalog store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::{Entity, EntityType, OldestEvaluation};

use crate::catalog::CatalogStore;
use crate::error::StoreError;

/// [`CatalogStore`] backed by the platform's PostgreSQL database.
///
/// Queries are runtime-checked (`query_as`), so no live database is
/// required at compile time.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Connect to the catalog database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (shared with other components).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntityRow {
    id: Uuid,
    entity_type: String,
    project_id: Uuid,
    provider_id: Uuid,
    name: String,
}

impl TryFrom<EntityRow> for Entity {
    type Error = StoreError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let entity_type = row
            .entity_type
            .parse::<EntityType>()
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;
        Ok(Entity {
            id: row.id,
            entity_type,
            project_id: row.project_id,
            provider_id: row.provider_id,
            name: row.name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OldestEvaluationRow {
    entity_id: Uuid,
    oldest_last_updated: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_entities_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
        limit: u32,
    ) -> Result<Vec<Entity>, StoreError> {
        let rows = sqlx::query_as::<_, EntityRow>(
            "SELECT id, entity_type, project_id, provider_id, name \
             FROM entities \
             WHERE entity_type = $1 AND id > $2 \
             ORDER BY id ASC \
             LIMIT $3",
        )
        .bind(entity_type.to_string())
        .bind(after)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Entity::try_from).collect()
    }

    async fn entity_exists_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM entities WHERE entity_type = $1 AND id > $2)",
        )
        .bind(entity_type.to_string())
        .bind(after)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn oldest_rule_evaluations(
        &self,
        entity_ids: &[Uuid],
    ) -> Result<Vec<OldestEvaluation>, StoreError> {
        let rows = sqlx::query_as::<_, OldestEvaluationRow>(
            "SELECT entity_id, MIN(last_updated) AS oldest_last_updated \
             FROM rule_evaluations \
             WHERE entity_id = ANY($1) \
             GROUP BY entity_id",
        )
        .bind(entity_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OldestEvaluation {
                entity_id: row.entity_id,
                oldest_last_updated: row.oldest_last_updated,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_row_conversion() {
        let row = EntityRow {
            id: Uuid::new_v4(),
            entity_type: "repository".to_string(),
            project_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            name: "acme/widgets".to_string(),
        };
        let entity = Entity::try_from(row).unwrap();
        assert_eq!(entity.entity_type, EntityType::Repository);
        assert_eq!(entity.name, "acme/widgets");
    }

    #[test]
    fn entity_row_rejects_unknown_type() {
        let row = EntityRow {
            id: Uuid::new_v4(),
            entity_type: "webhook".to_string(),
            project_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            name: "x".to_string(),
        };
        assert!(Entity::try_from(row).is_err());
    }
}
