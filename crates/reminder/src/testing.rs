//! Hand-written test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use warden_core::{Entity, EntityType, OldestEvaluation};
use warden_events::{EventPublisher, EventsError, Message};
use warden_store::{CatalogStore, StoreError};

/// Deterministic entity whose id embeds `n`, so catalog order follows `n`.
pub(crate) fn entity(n: u8) -> Entity {
    Entity {
        id: Uuid::from_u128(u128::from(n)),
        entity_type: EntityType::Repository,
        project_id: Uuid::from_u128(0x1000 + u128::from(n)),
        provider_id: Uuid::from_u128(0x2000 + u128::from(n)),
        name: format!("acme/repo-{n}"),
    }
}

/// Take one failure from a countdown counter.
fn take_failure(remaining: &AtomicU32) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn injected() -> StoreError {
    StoreError::InvalidRow("injected failure".to_string())
}

/// In-memory catalog with failure injection and call counters.
pub(crate) struct MockCatalog {
    entities: Mutex<Vec<Entity>>,
    evaluations: Mutex<HashMap<Uuid, DateTime<Utc>>>,
    pub list_calls: AtomicU32,
    pub probe_calls: AtomicU32,
    pub evaluation_calls: AtomicU32,
    fail_list: AtomicU32,
    fail_probe: AtomicU32,
    fail_evaluations: AtomicU32,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(Vec::new()),
            evaluations: Mutex::new(HashMap::new()),
            list_calls: AtomicU32::new(0),
            probe_calls: AtomicU32::new(0),
            evaluation_calls: AtomicU32::new(0),
            fail_list: AtomicU32::new(0),
            fail_probe: AtomicU32::new(0),
            fail_evaluations: AtomicU32::new(0),
        }
    }

    pub fn with_entities(self, mut entities: Vec<Entity>) -> Self {
        entities.sort_by_key(|e| e.id);
        *self.entities.lock().unwrap() = entities;
        self
    }

    pub fn with_evaluation(self, entity_id: Uuid, oldest: DateTime<Utc>) -> Self {
        self.evaluations.lock().unwrap().insert(entity_id, oldest);
        self
    }

    /// The next `n` list calls fail.
    #[allow(dead_code)]
    pub fn failing_list(self, n: u32) -> Self {
        self.fail_list.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` existence probes fail.
    pub fn failing_probe(self, n: u32) -> Self {
        self.fail_probe.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` evaluation lookups fail.
    pub fn failing_evaluations(self, n: u32) -> Self {
        self.fail_evaluations.store(n, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl CatalogStore for MockCatalog {
    async fn list_entities_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
        limit: u32,
    ) -> Result<Vec<Entity>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_list) {
            return Err(injected());
        }
        let entities = self.entities.lock().unwrap();
        Ok(entities
            .iter()
            .filter(|e| e.entity_type == entity_type && e.id > after)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn entity_exists_after(
        &self,
        entity_type: EntityType,
        after: Uuid,
    ) -> Result<bool, StoreError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_probe) {
            return Err(injected());
        }
        let entities = self.entities.lock().unwrap();
        Ok(entities
            .iter()
            .any(|e| e.entity_type == entity_type && e.id > after))
    }

    async fn oldest_rule_evaluations(
        &self,
        entity_ids: &[Uuid],
    ) -> Result<Vec<OldestEvaluation>, StoreError> {
        self.evaluation_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_evaluations) {
            return Err(injected());
        }
        let evaluations = self.evaluations.lock().unwrap();
        Ok(entity_ids
            .iter()
            .filter_map(|id| {
                evaluations.get(id).map(|ts| OldestEvaluation {
                    entity_id: *id,
                    oldest_last_updated: *ts,
                })
            })
            .collect())
    }
}

/// Publisher that records batches and counts close calls.
pub(crate) struct MockPublisher {
    pub batches: Mutex<Vec<Vec<Message>>>,
    pub close_calls: AtomicU32,
    fail_publishes: AtomicU32,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            close_calls: AtomicU32::new(0),
            fail_publishes: AtomicU32::new(0),
        }
    }

    /// The next `n` publishes fail.
    pub fn failing_publishes(self, n: u32) -> Self {
        self.fail_publishes.store(n, Ordering::SeqCst);
        self
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl EventPublisher for MockPublisher {
    async fn publish_batch(&self, messages: &[Message]) -> Result<(), EventsError> {
        if take_failure(&self.fail_publishes) {
            return Err(EventsError::Closed);
        }
        self.batches.lock().unwrap().push(messages.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<(), EventsError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
