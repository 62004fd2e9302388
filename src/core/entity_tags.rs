// src/core/entity_tags.rs

//! `EntityTagsRecord`: one entity's raw per-source tag buckets and its
//! memoized, priority-resolved view. A mutex-guarded inner struct whose
//! resolved view is rebuilt fresh on every cache miss rather than mutated
//! in place.

use crate::core::collation::collate;
use crate::core::errors::TagStoreError;
use crate::core::priority::PriorityRegistry;
use crate::core::types::Cardinality;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An owned view of an entity's resolved tags at a particular cardinality,
/// returned to callers outright — they may do anything with it.
#[derive(Debug, Clone, Default)]
pub struct ResolvedView {
    pub tags: Vec<Bytes>,
    pub sources: Vec<Bytes>,
    pub hash: String,
}

/// The memoized, priority-resolved view of an entity's tags, valid exactly
/// when present. Rebuilt as a fresh allocation on every cache miss rather
/// than mutated in place, so a `ResolvedView` handed out before an
/// invalidation stays correct for as long as its owner holds it.
#[derive(Clone)]
struct ResolvedCache {
    resolved_all: Arc<[Bytes]>,
    low_end: usize,
    orchestrator_end: usize,
    sources: Arc<[Bytes]>,
    hash: Arc<str>,
}

#[derive(Default)]
struct Inner {
    low: HashMap<Bytes, Vec<Bytes>>,
    orchestrator: HashMap<Bytes, Vec<Bytes>>,
    high: HashMap<Bytes, Vec<Bytes>>,
    standard: HashMap<Bytes, Vec<Bytes>>,
    cache: Option<ResolvedCache>,
}

/// One entity's tag record. Created the first time a non-delete update for
/// its ID arrives; destroyed only by `TagStore::prune`.
pub struct EntityTagsRecord {
    inner: Mutex<Inner>,
}

impl EntityTagsRecord {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Applies a whole-source replace of all four buckets for `source`,
    /// rejecting the update if it is a cache-miss record colliding with a
    /// previously-written `low` bucket entry for the same source.
    pub async fn apply_update(
        &self,
        source: Bytes,
        cache_miss: bool,
        low_card_tags: Vec<Bytes>,
        orchestrator_card_tags: Vec<Bytes>,
        high_card_tags: Vec<Bytes>,
        standard_tags: Vec<Bytes>,
    ) -> Result<(), TagStoreError> {
        let mut inner = self.inner.lock().await;

        // The `low` bucket's mere presence for this source is the proxy for
        // "we already have an authoritative write"; a cache-miss record must
        // not be allowed to clobber it.
        if cache_miss && inner.low.contains_key(&source) {
            return Err(TagStoreError::CacheMissOverwrite);
        }

        inner.low.insert(source.clone(), low_card_tags);
        inner.orchestrator.insert(source.clone(), orchestrator_card_tags);
        inner.high.insert(source.clone(), high_card_tags);
        inner.standard.insert(source, standard_tags);
        inner.cache = None;
        Ok(())
    }

    /// Returns the resolved view at `cardinality`, collating on a cache miss.
    pub async fn get(&self, cardinality: Cardinality, priorities: &PriorityRegistry) -> ResolvedView {
        let mut inner = self.inner.lock().await;

        if inner.cache.is_none() {
            let collation = collate(&inner.low, &inner.orchestrator, &inner.high, priorities);
            inner.cache = Some(ResolvedCache {
                resolved_all: collation.resolved_all.into(),
                low_end: collation.low_end,
                orchestrator_end: collation.orchestrator_end,
                sources: collation.sources.into(),
                hash: collation.hash.into(),
            });
        }

        let cache = inner.cache.as_ref().expect("cache populated above");
        let end = match cardinality {
            Cardinality::Low => cache.low_end,
            Cardinality::Orchestrator => cache.orchestrator_end,
            Cardinality::High => cache.resolved_all.len(),
        };

        ResolvedView {
            tags: cache.resolved_all[..end].to_vec(),
            sources: cache.sources.to_vec(),
            hash: cache.hash.to_string(),
        }
    }

    /// The union of all `standard` buckets across sources, concatenated
    /// without deduplication.
    pub async fn standard_tags(&self) -> Vec<Bytes> {
        let inner = self.inner.lock().await;
        inner.standard.values().flat_map(|tags| tags.iter().cloned()).collect()
    }
}

impl Default for EntityTagsRecord {
    fn default() -> Self {
        Self::new()
    }
}
