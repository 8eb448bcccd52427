use crate::init_tracing;
use crate::utils::{connect, last_roster};
use huddle_core::Role;
use huddle_server::presence::PresenceStore;
use huddle_server::room::RoomService;
use huddle_server::signaling::ConnectionRegistry;
use huddle_server::ServerError;
use std::sync::Arc;

fn service() -> (Arc<ConnectionRegistry>, RoomService) {
    let registry = Arc::new(ConnectionRegistry::new());
    let rooms = RoomService::new(PresenceStore::local_only(), registry.clone());
    (registry, rooms)
}

#[tokio::test]
async fn join_broadcasts_snapshot_to_all_members() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, mut ann_rx) = connect(&registry);
    let (bob, mut bob_rx) = connect(&registry);

    rooms.on_join(ann.clone(), "r1", "ann", Role::Host).await.unwrap();
    assert_eq!(last_roster(&mut ann_rx), Some(vec!["ann".to_string()]));

    rooms.on_join(bob.clone(), "r1", "bob", Role::Guest).await.unwrap();
    let expected = Some(vec!["ann".to_string(), "bob".to_string()]);
    assert_eq!(last_roster(&mut ann_rx), expected);
    assert_eq!(last_roster(&mut bob_rx), expected);
}

#[tokio::test]
async fn repeated_join_refreshes_instead_of_duplicating() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, mut ann_rx) = connect(&registry);

    rooms.on_join(ann.clone(), "r1", "ann", Role::Guest).await.unwrap();
    rooms.on_join(ann.clone(), "r1", "ann", Role::Host).await.unwrap();

    assert_eq!(last_roster(&mut ann_rx), Some(vec!["ann".to_string()]));
    let members = rooms.members("r1").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, Role::Host);
}

#[tokio::test]
async fn malformed_join_is_rejected_without_mutation() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, _ann_rx) = connect(&registry);

    let err = rooms.on_join(ann.clone(), "", "ann", Role::Guest).await.unwrap_err();
    assert!(matches!(err, ServerError::MalformedRequest(_)));

    let err = rooms.on_join(ann.clone(), "r1", "", Role::Guest).await.unwrap_err();
    assert!(matches!(err, ServerError::MalformedRequest(_)));

    assert!(rooms.members("r1").await.unwrap().is_empty());
}

#[tokio::test]
async fn leave_is_a_noop_for_non_members() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, mut ann_rx) = connect(&registry);
    let (stranger, _rx) = connect(&registry);

    rooms.on_join(ann.clone(), "r1", "ann", Role::Host).await.unwrap();
    rooms.on_leave(&stranger, "r1").await.unwrap();

    assert_eq!(last_roster(&mut ann_rx), Some(vec!["ann".to_string()]));
    assert_eq!(rooms.members("r1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn disconnect_broadcasts_to_remaining_members_and_is_idempotent() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, _ann_rx) = connect(&registry);
    let (bob, mut bob_rx) = connect(&registry);

    rooms.on_join(ann.clone(), "r1", "ann", Role::Host).await.unwrap();
    rooms.on_join(bob.clone(), "r1", "bob", Role::Guest).await.unwrap();

    registry.remove(&ann);
    rooms.on_disconnect(&ann).await.unwrap();
    assert_eq!(last_roster(&mut bob_rx), Some(vec!["bob".to_string()]));

    // Already gone: second disconnect must be safe and silent.
    rooms.on_disconnect(&ann).await.unwrap();
    assert_eq!(last_roster(&mut bob_rx), None);
}

#[tokio::test]
async fn disconnect_after_explicit_leave_is_safe() {
    init_tracing();
    let (registry, rooms) = service();
    let (ann, _ann_rx) = connect(&registry);

    rooms.on_join(ann.clone(), "r1", "ann", Role::Host).await.unwrap();
    rooms.on_leave(&ann, "r1").await.unwrap();
    rooms.on_disconnect(&ann).await.unwrap();

    assert!(rooms.members("r1").await.unwrap().is_empty());
}
