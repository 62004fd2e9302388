// src/lib.rs

//! A concurrent, in-memory entity tag store.
//!
//! Collectors report tags for entities (containers, pods, hosts); consumers
//! query the store by entity ID and a cardinality ceiling and get back the
//! unioned, priority-resolved tag set, or subscribe to a live stream of
//! entity additions, modifications and deletions.

pub mod config;
pub mod core;

pub use crate::core::errors::TagStoreError;
pub use crate::core::priority::{PriorityRegistry, PriorityRegistryBuilder};
pub use crate::core::pubsub::{Event, EntityEvent, EventType, Subscription};
pub use crate::core::store::TagStore;
pub use crate::core::types::{Cardinality, SourcePriority, TagUpdate};
