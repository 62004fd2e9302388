use bytes::Bytes;
use tagstore::{Cardinality, EventType, PriorityRegistry, SourcePriority, TagStore, TagStoreError, TagUpdate};

fn tags(values: &[&str]) -> Vec<Bytes> {
    values.iter().map(|v| Bytes::from(v.to_string())).collect()
}

fn update(entity: &str, source: &str, low: &[&str]) -> TagUpdate {
    TagUpdate {
        entity: Bytes::from(entity.to_string()),
        source: Bytes::from(source.to_string()),
        low_card_tags: tags(low),
        ..Default::default()
    }
}

fn store() -> TagStore {
    let priorities = PriorityRegistry::builder()
        .with_priority(Bytes::from_static(b"docker"), SourcePriority::NodeRuntime)
        .with_priority(Bytes::from_static(b"kubelet"), SourcePriority::NodeOrchestrator)
        .build();
    TagStore::new(priorities)
}

#[tokio::test]
async fn single_source_low_only_is_resolvable() {
    let store = store();
    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;

    let (tags, sources, hash) = store.lookup(&Bytes::from_static(b"host-1"), Cardinality::Low).await;
    assert_eq!(tags, vec![Bytes::from_static(b"env:prod")]);
    assert_eq!(sources, vec![Bytes::from_static(b"docker")]);
    assert!(!hash.is_empty());
}

#[tokio::test]
async fn conflicting_key_resolves_to_higher_priority_source() {
    let store = store();
    store
        .process_tag_info(vec![
            Some(update("host-1", "docker", &["env:staging"])),
            Some(update("host-1", "kubelet", &["env:prod"])),
        ])
        .await;

    let (tags, _, _) = store.lookup(&Bytes::from_static(b"host-1"), Cardinality::Low).await;
    assert_eq!(tags, vec![Bytes::from_static(b"env:prod")]);
}

#[tokio::test]
async fn lookup_of_absent_entity_returns_empty_results() {
    let store = store();
    let (tags, sources, hash) = store.lookup(&Bytes::from_static(b"ghost"), Cardinality::Low).await;
    assert!(tags.is_empty());
    assert!(sources.is_empty());
    assert!(hash.is_empty());
}

#[tokio::test]
async fn lookup_standard_fails_for_an_absent_entity() {
    let store = store();
    let result = store.lookup_standard(&Bytes::from_static(b"ghost")).await;
    assert_eq!(result, Err(TagStoreError::EntityNotFound(Bytes::from_static(b"ghost"))));
}

#[tokio::test]
async fn lookup_standard_unions_across_sources() {
    let store = store();
    store
        .process_tag_info(vec![
            Some(TagUpdate {
                entity: Bytes::from_static(b"host-1"),
                source: Bytes::from_static(b"docker"),
                standard_tags: tags(&["team:infra"]),
                ..Default::default()
            }),
            Some(TagUpdate {
                entity: Bytes::from_static(b"host-1"),
                source: Bytes::from_static(b"kubelet"),
                standard_tags: tags(&["team:infra"]),
                ..Default::default()
            }),
        ])
        .await;

    let result = store.lookup_standard(&Bytes::from_static(b"host-1")).await.unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn delete_lifecycle_requires_prune() {
    let store = store();
    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;

    store
        .process_tag_info(vec![Some(TagUpdate {
            entity: Bytes::from_static(b"host-1"),
            source: Bytes::from_static(b"docker"),
            delete_entity: true,
            ..Default::default()
        })])
        .await;

    let (tags, _, _) = store.lookup(&Bytes::from_static(b"host-1"), Cardinality::Low).await;
    assert_eq!(tags, vec![Bytes::from_static(b"env:prod")], "entity survives until prune runs");

    store.prune().await;
    let (tags, _, _) = store.lookup(&Bytes::from_static(b"host-1"), Cardinality::Low).await;
    assert!(tags.is_empty());
}

#[tokio::test]
async fn subscriber_receives_exactly_one_deleted_event_on_prune() {
    let store = store();
    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;
    let mut subscription = store.subscribe(Cardinality::Low).await;
    let _snapshot = subscription.receiver.recv().await.unwrap();

    store
        .process_tag_info(vec![Some(TagUpdate {
            entity: Bytes::from_static(b"host-1"),
            source: Bytes::from_static(b"docker"),
            delete_entity: true,
            ..Default::default()
        })])
        .await;
    store.prune().await;

    let batch = subscription.receiver.recv().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].event_type, EventType::Deleted);
    assert!(batch[0].entity.tags.is_empty());
}

#[tokio::test]
async fn subscribe_delivers_a_snapshot_then_incremental_adds() {
    let store = store();
    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;

    let mut subscription = store.subscribe(Cardinality::Low).await;
    let snapshot = subscription.receiver.recv().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].event_type, EventType::Added);
    assert_eq!(snapshot[0].entity.id, Bytes::from_static(b"host-1"));

    store.process_tag_info(vec![Some(update("host-2", "docker", &["env:staging"]))]).await;
    let incremental = subscription.receiver.recv().await.unwrap();
    assert_eq!(incremental.len(), 1);
    assert_eq!(incremental[0].entity.id, Bytes::from_static(b"host-2"));
}

#[tokio::test]
async fn cache_miss_guard_is_a_no_op_on_the_store() {
    let store = store();
    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;

    store
        .process_tag_info(vec![Some(TagUpdate {
            entity: Bytes::from_static(b"host-1"),
            source: Bytes::from_static(b"docker"),
            cache_miss: true,
            low_card_tags: tags(&["env:stale"]),
            ..Default::default()
        })])
        .await;

    let (tags, _, _) = store.lookup(&Bytes::from_static(b"host-1"), Cardinality::Low).await;
    assert_eq!(tags, vec![Bytes::from_static(b"env:prod")]);
}

#[tokio::test]
async fn batch_classifies_add_once_then_modify() {
    let store = store();
    let mut subscription = store.subscribe(Cardinality::Low).await;

    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;
    let added = subscription.receiver.recv().await.unwrap();
    assert_eq!(added[0].event_type, EventType::Added);

    store.process_tag_info(vec![Some(update("host-1", "kubelet", &["env:staging"]))]).await;
    let modified = subscription.receiver.recv().await.unwrap();
    assert_eq!(modified[0].event_type, EventType::Modified);
}

#[tokio::test]
async fn unsubscribe_stops_further_delivery() {
    let store = store();
    let subscription = store.subscribe(Cardinality::Low).await;
    store.unsubscribe(subscription.id).await;

    store.process_tag_info(vec![Some(update("host-1", "docker", &["env:prod"]))]).await;

    let mut receiver = subscription.receiver;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn unknown_unsubscribe_is_a_silent_no_op() {
    let store = store();
    store.unsubscribe(9999).await;
}
