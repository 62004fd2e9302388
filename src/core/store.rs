// src/core/store.rs

//! `TagStore`: the registry that owns every `EntityTagsRecord`, the
//! deferred-delete set, and the subscriber table. A top-level reader-writer
//! lock guards the entity table; record-level locks are taken only after it
//! is released, under a fixed lock-acquisition order to avoid deadlock
//! across the two.
//!
//! Lock hierarchy (must always be acquired in this order):
//! 1. `to_delete`
//! 2. `store`
//! 3. `subscribers`
//! 4. per-`EntityTagsRecord`

use crate::core::entity_tags::EntityTagsRecord;
use crate::core::errors::TagStoreError;
use crate::core::metrics::{STORED_ENTITIES, UPDATED_ENTITIES_TOTAL};
use crate::core::priority::PriorityRegistry;
use crate::core::pubsub::{EntityEvent, Event, EventType, SUBSCRIBER_BUFFER, Subscriber, Subscription};
use crate::core::types::{Cardinality, TagUpdate};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, trace};

/// The entity tag store. Cheap to share: clone the `Arc` a host wraps it in,
/// rather than the store itself.
pub struct TagStore {
    store: RwLock<HashMap<Bytes, Arc<EntityTagsRecord>>>,
    to_delete: Mutex<HashSet<Bytes>>,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_subscriber_id: AtomicU64,
    priorities: PriorityRegistry,
}

impl TagStore {
    pub fn new(priorities: PriorityRegistry) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            to_delete: Mutex::new(HashSet::new()),
            subscribers: RwLock::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            priorities,
        }
    }

    /// Applies an ordered batch of update records. Structurally-invalid and
    /// rejected records are logged and skipped; the batch never aborts.
    pub async fn process_tag_info(&self, batch: Vec<Option<TagUpdate>>) {
        let mut added: Vec<Bytes> = Vec::new();
        let mut modified: Vec<Bytes> = Vec::new();
        let mut classified: HashSet<Bytes> = HashSet::new();
        let mut touched: HashMap<Bytes, Arc<EntityTagsRecord>> = HashMap::new();

        for record in batch {
            let Some(update) = record else {
                trace!("skipping nil update record");
                continue;
            };
            if !update.is_valid() {
                trace!(entity = ?update.entity, source = ?update.source, "skipping structurally invalid update record");
                continue;
            }
            if update.delete_entity {
                self.to_delete.lock().await.insert(update.entity.clone());
                continue;
            }

            let (record, created) = self.get_or_create_entity(&update.entity).await;
            if created {
                STORED_ENTITIES.inc();
            }

            let apply_result = record
                .apply_update(
                    update.source.clone(),
                    update.cache_miss,
                    update.low_card_tags,
                    update.orchestrator_card_tags,
                    update.high_card_tags,
                    update.standard_tags,
                )
                .await;

            match apply_result {
                Ok(()) => UPDATED_ENTITIES_TOTAL.inc(),
                Err(TagStoreError::CacheMissOverwrite) => {
                    trace!(
                        entity = ?update.entity,
                        source = ?update.source,
                        "rejected cache-miss update: source already has an authoritative entry"
                    );
                }
                Err(_) => unreachable!("apply_update only ever returns CacheMissOverwrite"),
            }

            if classified.insert(update.entity.clone()) {
                if created {
                    added.push(update.entity.clone());
                } else {
                    modified.push(update.entity.clone());
                }
            }
            touched.entry(update.entity).or_insert(record);
        }

        if !added.is_empty() {
            self.notify_subscribers(EventType::Added, &added, &touched).await;
        }
        if !modified.is_empty() {
            self.notify_subscribers(EventType::Modified, &modified, &touched).await;
        }
    }

    /// Looks up or creates the record for `entity`, atomically with respect
    /// to other concurrent lookups for the same, not-yet-existing, ID.
    async fn get_or_create_entity(&self, entity: &Bytes) -> (Arc<EntityTagsRecord>, bool) {
        {
            let store = self.store.read().await;
            if let Some(record) = store.get(entity) {
                return (record.clone(), false);
            }
        }

        let mut store = self.store.write().await;
        if let Some(record) = store.get(entity) {
            return (record.clone(), false);
        }
        let record = Arc::new(EntityTagsRecord::new());
        store.insert(entity.clone(), record.clone());
        (record, true)
    }

    /// Returns the resolved tags, contributing sources and content hash for
    /// `entity` at `cardinality`, or three empty results if `entity` is
    /// absent from the store.
    pub async fn lookup(&self, entity: &Bytes, cardinality: Cardinality) -> (Vec<Bytes>, Vec<Bytes>, String) {
        let record = {
            let store = self.store.read().await;
            store.get(entity).cloned()
        };
        let Some(record) = record else {
            return (Vec::new(), Vec::new(), String::new());
        };
        let view = record.get(cardinality, &self.priorities).await;
        (view.tags, view.sources, view.hash)
    }

    /// Returns the union (no dedup) of every source's `standard` tags for
    /// `entity`, or `EntityNotFound` if it is absent from the store.
    pub async fn lookup_standard(&self, entity: &Bytes) -> Result<Vec<Bytes>, TagStoreError> {
        let record = {
            let store = self.store.read().await;
            store.get(entity).cloned()
        };
        let record = record.ok_or_else(|| TagStoreError::EntityNotFound(entity.clone()))?;
        Ok(record.standard_tags().await)
    }

    /// Drains the deferred-delete set, removing each entity from the store
    /// and firing a single `Deleted` notification batch. A no-op if nothing
    /// is pending.
    pub async fn prune(&self) {
        let mut to_delete = self.to_delete.lock().await;
        if to_delete.is_empty() {
            return;
        }

        let removed = {
            let mut store = self.store.write().await;
            let mut removed = Vec::with_capacity(to_delete.len());
            for entity in to_delete.drain() {
                if store.remove(&entity).is_some() {
                    removed.push(entity);
                }
            }
            removed
        };
        drop(to_delete);

        if !removed.is_empty() {
            debug!(count = removed.len(), "pruned entities");
            self.notify_subscribers(EventType::Deleted, &removed, &HashMap::new()).await;
        }

        STORED_ENTITIES.set(self.store.read().await.len() as f64);
    }

    /// Registers a new subscriber, delivering a single snapshot batch of
    /// `Added` events for every entity currently in the store before
    /// returning. No entity can appear in both this snapshot and a
    /// subsequent live event: the store read-lock (blocking new entity
    /// insertion) and the subscribers write-lock (blocking concurrent
    /// notification delivery) are held together for the whole operation.
    pub async fn subscribe(&self, cardinality: Cardinality) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);

        let store = self.store.read().await;
        let mut subscribers = self.subscribers.write().await;

        let mut events = Vec::with_capacity(store.len());
        for (entity, record) in store.iter() {
            let view = record.get(cardinality, &self.priorities).await;
            events.push(Event {
                event_type: EventType::Added,
                entity: EntityEvent {
                    id: entity.clone(),
                    tags: view.tags,
                },
            });
        }

        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        subscribers.insert(id, Subscriber { sender: sender.clone(), cardinality });

        if !events.is_empty() && sender.send(events).await.is_err() {
            trace!(subscriber = id, "snapshot delivery failed: receiver dropped immediately");
        }

        drop(subscribers);
        drop(store);

        Subscription { id, receiver }
    }

    /// Removes a subscriber, closing its channel. An unknown or
    /// already-removed id is a silent no-op rather than a caller-visible
    /// error.
    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.remove(&id);
    }

    /// Delivers one batch per subscriber, each containing an event per
    /// entity in `entities`, with tags computed at that subscriber's own
    /// cardinality. For `Deleted`, `touched` is expected to be empty and
    /// every event carries an empty tag sequence.
    async fn notify_subscribers(
        &self,
        event_type: EventType,
        entities: &[Bytes],
        touched: &HashMap<Bytes, Arc<EntityTagsRecord>>,
    ) {
        if entities.is_empty() {
            return;
        }

        let subscribers = self.subscribers.read().await;
        for (id, subscriber) in subscribers.iter() {
            let mut events = Vec::with_capacity(entities.len());
            for entity in entities {
                let tags = match (event_type, touched.get(entity)) {
                    (EventType::Deleted, _) | (_, None) => Vec::new(),
                    (_, Some(record)) => record.get(subscriber.cardinality, &self.priorities).await.tags,
                };
                events.push(Event {
                    event_type,
                    entity: EntityEvent { id: entity.clone(), tags },
                });
            }

            if subscriber.sender.send(events).await.is_err() {
                trace!(subscriber = id, "notification delivery failed: receiver dropped without unsubscribing");
            }
        }
    }
}
