// src/config.rs

//! Loads the source → priority mapping that the collation engine consults.
//!
//! `PriorityConfig` is the on-disk, `serde`-deserialized shape; `PriorityRegistry`
//! (in `core::priority`) is the validated, in-memory form the store actually
//! reads from at runtime.

use crate::core::priority::PriorityRegistry;
use crate::core::types::SourcePriority;
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// The on-disk shape of the priority registry, e.g.:
///
/// ```toml
/// [priorities]
/// cluster-orchestrator = "cluster-orchestrator"
/// node-orchestrator = "node-orchestrator"
/// node-runtime = "node-runtime"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriorityConfig {
    #[serde(default)]
    priorities: HashMap<String, String>,
}

impl PriorityConfig {
    /// Loads a `PriorityConfig` from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read priority config from {}", path.display()))?;

        let parsed: Self = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse priority config from {}", path.display()))?;

        info!(
            path = %path.display(),
            sources = parsed.priorities.len(),
            "loaded priority configuration"
        );
        Ok(parsed)
    }

    /// Converts the parsed configuration into a runtime `PriorityRegistry`,
    /// rejecting unknown priority tier names.
    pub fn into_registry(self) -> Result<PriorityRegistry> {
        let mut builder = PriorityRegistry::builder();
        for (source, tier) in self.priorities {
            let priority = parse_tier(&tier)
                .with_context(|| format!("unknown priority tier '{tier}' for source '{source}'"))?;
            builder = builder.with_priority(Bytes::from(source), priority);
        }
        Ok(builder.build())
    }
}

fn parse_tier(tier: &str) -> Result<SourcePriority> {
    match tier {
        "low" | "node-runtime" => Ok(SourcePriority::NodeRuntime),
        "node-orchestrator" => Ok(SourcePriority::NodeOrchestrator),
        "cluster-orchestrator" => Ok(SourcePriority::ClusterOrchestrator),
        other => bail!("unrecognized priority tier: {other}"),
    }
}
