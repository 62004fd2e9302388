// src/core/priority.rs

//! The read-only source → priority mapping the collation engine consults.
//!
//! Constructed once (from `config::PriorityConfig`, or directly via
//! `PriorityRegistry::builder()` for embedders and tests) and never mutated
//! afterward, so it needs no lock of its own.

use crate::core::types::SourcePriority;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::warn;

/// An immutable mapping from source name to its static priority tier.
#[derive(Debug, Clone, Default)]
pub struct PriorityRegistry {
    priorities: HashMap<Bytes, SourcePriority>,
}

impl PriorityRegistry {
    pub fn builder() -> PriorityRegistryBuilder {
        PriorityRegistryBuilder::default()
    }

    /// Returns the priority for `source`, defaulting to the lowest tier and
    /// logging a warning if `source` has no registry entry.
    pub fn priority_of(&self, source: &Bytes) -> SourcePriority {
        match self.priorities.get(source) {
            Some(priority) => *priority,
            None => {
                warn!(
                    source = ?source,
                    default = ?SourcePriority::default(),
                    "source has no priority registry entry, using default"
                );
                SourcePriority::default()
            }
        }
    }
}

/// Builds a `PriorityRegistry` in-process, without going through
/// `config::PriorityConfig`'s TOML file loading.
#[derive(Debug, Default)]
pub struct PriorityRegistryBuilder {
    priorities: HashMap<Bytes, SourcePriority>,
}

impl PriorityRegistryBuilder {
    pub fn with_priority(mut self, source: Bytes, priority: SourcePriority) -> Self {
        self.priorities.insert(source, priority);
        self
    }

    pub fn build(self) -> PriorityRegistry {
        PriorityRegistry {
            priorities: self.priorities,
        }
    }
}
