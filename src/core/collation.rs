// src/core/collation.rs

//! The pure priority-resolution collation algorithm, invoked by
//! `EntityTagsRecord` on a cache miss. Takes no lock of its own: it runs
//! entirely under the record lock its caller already holds.

use crate::core::hash::tags_hash;
use crate::core::priority::PriorityRegistry;
use crate::core::types::{Cardinality, SourcePriority, tag_key};
use bytes::Bytes;
use std::collections::HashMap;

/// One candidate value for a tag key, carrying enough to decide whether it
/// survives priority resolution.
struct Candidate {
    tag: Bytes,
    priority: SourcePriority,
    cardinality: Cardinality,
}

/// The result of collating an entity's per-source buckets: the resolved,
/// de-duplicated, priority-filtered tag sequence plus its prefix bounds.
pub struct Collation {
    pub sources: Vec<Bytes>,
    pub resolved_all: Vec<Bytes>,
    pub low_end: usize,
    pub orchestrator_end: usize,
    pub hash: String,
}

/// Collates the three cardinality buckets of a single entity into a single
/// priority-resolved view. `low`/`orchestrator`/`high` each map a source
/// name to the sequence of tags it contributed at that cardinality.
pub fn collate(
    low: &HashMap<Bytes, Vec<Bytes>>,
    orchestrator: &HashMap<Bytes, Vec<Bytes>>,
    high: &HashMap<Bytes, Vec<Bytes>>,
    priorities: &PriorityRegistry,
) -> Collation {
    let sources: Vec<Bytes> = low.keys().cloned().collect();

    let mut by_key: HashMap<Bytes, Vec<Candidate>> = HashMap::new();
    for (bucket, cardinality) in [
        (low, Cardinality::Low),
        (orchestrator, Cardinality::Orchestrator),
        (high, Cardinality::High),
    ] {
        for (source, tags) in bucket {
            let priority = priorities.priority_of(source);
            for tag in tags {
                by_key.entry(tag_key(tag)).or_default().push(Candidate {
                    tag: tag.clone(),
                    priority,
                    cardinality,
                });
            }
        }
    }

    let mut low_out = Vec::new();
    let mut orch_out = Vec::new();
    let mut high_out = Vec::new();

    for candidates in by_key.into_values() {
        let max_priority = candidates
            .iter()
            .map(|c| c.priority)
            .max()
            .expect("candidate list for a key is never empty");

        for candidate in candidates {
            if candidate.priority < max_priority {
                continue;
            }
            match candidate.cardinality {
                Cardinality::Low => low_out.push(candidate.tag),
                Cardinality::Orchestrator => orch_out.push(candidate.tag),
                Cardinality::High => high_out.push(candidate.tag),
            }
        }
    }

    let low_end = low_out.len();
    let orchestrator_end = low_end + orch_out.len();

    let mut resolved_all = low_out;
    resolved_all.extend(orch_out);
    resolved_all.extend(high_out);

    let hash = tags_hash(&resolved_all);

    Collation {
        sources,
        resolved_all,
        low_end,
        orchestrator_end,
        hash,
    }
}
