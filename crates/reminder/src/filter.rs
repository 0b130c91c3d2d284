//! Freshness filter: decides eligibility from evaluation timestamps.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use warden_core::Entity;
use warden_store::{CatalogStore, StoreError};

/// Return the subset of `entities` whose oldest rule-evaluation is
/// strictly older than `now − min_elapsed`, preserving input order,
/// along with the `entity_id → oldest_last_updated` map for metric
/// emission.
///
/// Entities with no evaluation history are excluded: they have never
/// been evaluated, and first evaluation is the bootstrap pipeline's
/// job, not the reminder's. An entity whose timestamp equals the cutoff
/// exactly is not eligible.
///
/// An empty input returns empty output without calling the store. A
/// store error fails the whole tick — no partial emission.
pub async fn filter_eligible(
    store: &dyn CatalogStore,
    entities: &[Entity],
    min_elapsed: Duration,
    now: DateTime<Utc>,
) -> Result<(Vec<Entity>, HashMap<Uuid, DateTime<Utc>>), StoreError> {
    if entities.is_empty() {
        return Ok((Vec::new(), HashMap::new()));
    }

    let ids: Vec<Uuid> = entities.iter().map(|e| e.id).collect();
    let ages = store.oldest_rule_evaluations(&ids).await?;
    let last_updated: HashMap<Uuid, DateTime<Utc>> = ages
        .into_iter()
        .map(|age| (age.entity_id, age.oldest_last_updated))
        .collect();

    let cutoff = now
        - chrono::Duration::from_std(min_elapsed).unwrap_or_else(|_| chrono::Duration::zero());

    let eligible = entities
        .iter()
        .filter(|entity| match last_updated.get(&entity.id) {
            Some(ts) => *ts < cutoff,
            None => {
                debug!(entity_id = %entity.id, "no evaluation history, skipping");
                false
            }
        })
        .cloned()
        .collect();

    Ok((eligible, last_updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entity, MockCatalog};
    use std::sync::atomic::Ordering;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn empty_input_skips_the_store() {
        let store = MockCatalog::new();
        let now = Utc::now();
        let (eligible, map) = filter_eligible(&store, &[], HOUR, now).await.unwrap();
        assert!(eligible.is_empty());
        assert!(map.is_empty());
        assert_eq!(store.evaluation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_entities_are_eligible() {
        let now = Utc::now();
        let e1 = entity(1);
        let e2 = entity(2);
        let store = MockCatalog::new()
            .with_entities(vec![e1.clone(), e2.clone()])
            .with_evaluation(e1.id, now - chrono::Duration::hours(2))
            .with_evaluation(e2.id, now - chrono::Duration::minutes(30));

        let (eligible, map) =
            filter_eligible(&store, &[e1.clone(), e2.clone()], HOUR, now).await.unwrap();
        assert_eq!(eligible, vec![e1.clone()]);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&e2.id));
    }

    #[tokio::test]
    async fn exact_cutoff_is_not_eligible() {
        let now = Utc::now();
        let e1 = entity(1);
        let store = MockCatalog::new()
            .with_entities(vec![e1.clone()])
            .with_evaluation(e1.id, now - chrono::Duration::hours(1));

        let (eligible, _) = filter_eligible(&store, &[e1], HOUR, now).await.unwrap();
        assert!(eligible.is_empty());
    }

    #[tokio::test]
    async fn never_evaluated_entities_are_excluded() {
        let now = Utc::now();
        let e1 = entity(1);
        let store = MockCatalog::new().with_entities(vec![e1.clone()]);

        let (eligible, map) = filter_eligible(&store, &[e1], HOUR, now).await.unwrap();
        assert!(eligible.is_empty());
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn store_error_fails_the_filter() {
        let now = Utc::now();
        let e1 = entity(1);
        let store = MockCatalog::new()
            .with_entities(vec![e1.clone()])
            .failing_evaluations(1);

        assert!(filter_eligible(&store, &[e1], HOUR, now).await.is_err());
    }

    #[tokio::test]
    async fn zero_min_elapsed_means_any_past_evaluation() {
        let now = Utc::now();
        let e1 = entity(1);
        let store = MockCatalog::new()
            .with_entities(vec![e1.clone()])
            .with_evaluation(e1.id, now - chrono::Duration::seconds(1));

        let (eligible, _) =
            filter_eligible(&store, &[e1.clone()], Duration::ZERO, now).await.unwrap();
        assert_eq!(eligible, vec![e1]);
    }
}
