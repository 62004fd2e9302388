// src/core/errors.rs

//! Defines the error type surfaced (or deliberately not surfaced) by the
//! tag store.

use bytes::Bytes;
use thiserror::Error;

/// Errors the tag store can produce.
///
/// Most per-record failures (an invalid record, a cache-miss overwrite
/// attempt) are logged and dropped internally — they never reach this enum.
/// `TagStoreError` only covers what a caller can actually observe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagStoreError {
    /// `lookup_standard` was called for an entity with no record in the store.
    #[error("entity {0:?} not found")]
    EntityNotFound(Bytes),

    /// A cache-miss update was rejected because the source already had an
    /// authoritative entry. Never surfaced past `EntityTagsRecord::apply_update`;
    /// kept as a variant so the rejection has a named, loggable shape rather
    /// than a bare bool.
    #[error("cache-miss update rejected: source already has an authoritative entry")]
    CacheMissOverwrite,
}
