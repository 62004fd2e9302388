// src/core/pubsub.rs

//! Subscriber fan-out: batched event delivery over bounded channels, each
//! filtered to the subscriber's own cardinality ceiling. A table of
//! per-subscriber senders, keyed by an opaque id rather than a channel name.

use crate::core::types::Cardinality;
use bytes::Bytes;
use tokio::sync::mpsc;

/// The bound on each subscriber's event-batch channel. Producers can emit a
/// burst without blocking on a slow consumer, but lag beyond this many
/// batches applies back-pressure to the notifier.
pub const SUBSCRIBER_BUFFER: usize = 100;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

/// The entity-scoped payload of an event: its ID and its tags at the
/// observing subscriber's cardinality (empty for `Deleted`, since the
/// record is already gone by the time the event is built).
#[derive(Debug, Clone)]
pub struct EntityEvent {
    pub id: Bytes,
    pub tags: Vec<Bytes>,
}

/// A single entity lifecycle event.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub entity: EntityEvent,
}

/// A registered subscriber: where to deliver batches, and at what
/// cardinality each entity's view should be computed.
pub(crate) struct Subscriber {
    pub sender: mpsc::Sender<Vec<Event>>,
    pub cardinality: Cardinality,
}

/// The handle returned by `TagStore::subscribe`: an opaque id for
/// `unsubscribe`, and the receiver half of the event channel.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<Vec<Event>>,
}
