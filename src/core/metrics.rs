// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the tag store.
//!
//! `lazy_static` ensures these are registered exactly once for the process,
//! regardless of how many `TagStore` instances exist.

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, TextEncoder, register_counter, register_gauge};

lazy_static! {
    /// The number of entities currently held by the store.
    pub static ref STORED_ENTITIES: Gauge = register_gauge!(
        "tagstore_entities_stored",
        "Number of entities currently held by the tag store."
    )
    .unwrap();

    /// The total number of update records successfully applied to an entity.
    pub static ref UPDATED_ENTITIES_TOTAL: Counter = register_counter!(
        "tagstore_entity_updates_total",
        "Total number of update records successfully applied."
    )
    .unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text
/// format, for a host to splice into its own `/metrics` endpoint.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
