use crate::init_tracing;
use crate::utils::{FailingBacking, participant};
use huddle_core::{ParticipantId, Role};
use huddle_server::presence::{BackingSelector, PresenceBacking, PresenceStore};
use std::sync::Arc;

#[tokio::test]
async fn membership_tracks_join_leave_disconnect() {
    init_tracing();
    let store = PresenceStore::local_only();

    let ann = ParticipantId::new();
    let bob = ParticipantId::new();
    let cid = ParticipantId::new();

    store
        .join("r1", participant(&ann, "r1", "ann", Role::Host))
        .await
        .unwrap();
    store
        .join("r1", participant(&bob, "r1", "bob", Role::Guest))
        .await
        .unwrap();
    store
        .join("r1", participant(&cid, "r1", "cid", Role::Guest))
        .await
        .unwrap();

    store.leave("r1", &bob).await.unwrap();
    let room = store.remove_participant(&cid).await.unwrap();
    assert_eq!(room.as_deref(), Some("r1"));

    let names: Vec<_> = store
        .members("r1")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["ann"]);
}

#[tokio::test]
async fn concurrent_joins_produce_no_duplicates() {
    init_tracing();
    let store = Arc::new(PresenceStore::local_only());
    let n = 32;

    let mut handles = Vec::new();
    for i in 0..n {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = ParticipantId::new();
            store
                .join("crowded", participant(&id, "crowded", &format!("p{i}"), Role::Guest))
                .await
                .unwrap();
            id
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    let members = store.members("crowded").await.unwrap();
    assert_eq!(members.len(), n);

    let mut seen = members.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), n, "duplicate ids in membership");
}

#[tokio::test]
async fn durable_fault_trips_breaker_and_replays_on_local() {
    init_tracing();
    let durable = FailingBacking::new();
    let selector = Arc::new(BackingSelector::new());
    let durable_dyn: Arc<dyn PresenceBacking> = durable.clone();
    let store = PresenceStore::new(Some(durable_dyn), selector.clone());

    let ann = ParticipantId::new();
    let bob = ParticipantId::new();

    // Recorded durably before the fault.
    store
        .join("r1", participant(&ann, "r1", "ann", Role::Host))
        .await
        .unwrap();
    assert!(selector.durable_active());
    assert_eq!(durable.raw_members("r1").await.len(), 1);

    // The failing operation itself must still succeed, replayed locally.
    durable.start_failing();
    store
        .join("r1", participant(&bob, "r1", "bob", Role::Guest))
        .await
        .unwrap();
    assert!(!selector.durable_active());

    // Post-trip state is the local backing only: disjoint from what the
    // durable backing recorded before the fault.
    let names: Vec<_> = store
        .members("r1")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["bob"]);

    // Even after the durable backing recovers there is no mid-process
    // retry: new state keeps landing locally.
    durable.stop_failing();
    let cid = ParticipantId::new();
    store
        .join("r1", participant(&cid, "r1", "cid", Role::Guest))
        .await
        .unwrap();

    let names: Vec<_> = store
        .members("r1")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["bob", "cid"]);
    assert_eq!(durable.raw_members("r1").await.len(), 1, "durable state must be untouched");
}

#[tokio::test]
async fn trip_during_remove_still_reports_local_room() {
    init_tracing();
    let durable = FailingBacking::new();
    let durable_dyn: Arc<dyn PresenceBacking> = durable.clone();
    let store = PresenceStore::new(Some(durable_dyn), Arc::new(BackingSelector::new()));

    let ann = ParticipantId::new();
    durable.start_failing();

    // First op after the fault: join lands locally.
    store
        .join("r1", participant(&ann, "r1", "ann", Role::Host))
        .await
        .unwrap();

    // Disconnect path resolves against the same (local) backing.
    let room = store.remove_participant(&ann).await.unwrap();
    assert_eq!(room.as_deref(), Some("r1"));
    assert!(store.members("r1").await.unwrap().is_empty());
}
