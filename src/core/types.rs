// src/core/types.rs

//! The small, totally-ordered vocabulary types the rest of the store builds
//! on, plus the inbound update record shape.

use bytes::Bytes;

/// The cardinality ceiling a query or subscription is bounded by, and the
/// cardinality a tag was contributed at. Ordered `Low < Orchestrator < High`
/// via derive — the variant declaration order below *is* the total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinality {
    Low,
    Orchestrator,
    High,
}

/// A source's static rank, used to resolve conflicting tag values for the
/// same key. Higher variants win. Sources absent from the priority registry
/// default to `NodeRuntime`, the lowest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourcePriority {
    NodeRuntime,
    NodeOrchestrator,
    ClusterOrchestrator,
}

impl Default for SourcePriority {
    fn default() -> Self {
        SourcePriority::NodeRuntime
    }
}

/// One batch entry pushed by a collector.
///
/// `None` in a batch models a structurally-nil record from an upstream
/// producer; this struct itself is only ever constructed for a would-be
/// valid record, with emptiness of `entity`/`source` checked separately.
#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub entity: Bytes,
    pub source: Bytes,
    pub delete_entity: bool,
    pub cache_miss: bool,
    pub low_card_tags: Vec<Bytes>,
    pub orchestrator_card_tags: Vec<Bytes>,
    pub high_card_tags: Vec<Bytes>,
    pub standard_tags: Vec<Bytes>,
}

impl TagUpdate {
    /// A record is structurally invalid if it is missing an entity or a source.
    pub fn is_valid(&self) -> bool {
        !self.entity.is_empty() && !self.source.is_empty()
    }
}

/// Returns the tag key: the substring before the first `:`, or the whole
/// tag if there is no `:`.
pub fn tag_key(tag: &Bytes) -> Bytes {
    match tag.iter().position(|&b| b == b':') {
        Some(idx) => tag.slice(..idx),
        None => tag.clone(),
    }
}
