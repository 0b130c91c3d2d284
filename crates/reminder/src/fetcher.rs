//! Batch fetcher: pulls the next slice of the catalog past the cursor.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use warden_core::{Entity, EntityType};
use warden_store::{CatalogStore, StoreError};

use crate::cursor::Cursor;
use crate::filter::filter_eligible;

/// One tick's worth of catalog data.
#[derive(Debug, Default)]
pub struct FetchedBatch {
    /// Raw entities read past the cursor, in store order.
    pub entities: Vec<Entity>,
    /// The freshness filter's output, in store order.
    pub eligible: Vec<Entity>,
    /// `entity_id → oldest_last_updated` for send-delay metrics.
    pub last_updated: HashMap<Uuid, DateTime<Utc>>,
}

/// Fetch the next batch of repositories after `cursor` and run the
/// freshness filter over it.
///
/// The cursor only moves once the filter has succeeded, so a failed
/// tick retries the same catalog range. After a successful fetch the
/// cursor advances to the last entity and an existence probe decides
/// whether the sweep is over; a probe failure counts as end-of-catalog
/// rather than risking a stuck cursor.
pub async fn fetch_batch(
    store: &dyn CatalogStore,
    cursor: &mut Cursor,
    batch_size: u32,
    min_elapsed: Duration,
    now: DateTime<Utc>,
) -> Result<FetchedBatch, StoreError> {
    let entities = store
        .list_entities_after(EntityType::Repository, cursor.position(), batch_size)
        .await?;

    if entities.is_empty() {
        cursor.reset();
        return Ok(FetchedBatch::default());
    }

    let (eligible, last_updated) = filter_eligible(store, &entities, min_elapsed, now).await?;

    cursor.advance(&entities);
    match store
        .entity_exists_after(EntityType::Repository, cursor.position())
        .await
    {
        Ok(true) => {}
        Ok(false) => cursor.reset(),
        Err(e) => {
            warn!(error = %e, cursor = %cursor.position(), "existence probe failed, resetting cursor");
            cursor.reset();
        }
    }

    Ok(FetchedBatch {
        entities,
        eligible,
        last_updated,
    })
}
