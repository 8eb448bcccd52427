use crate::init_tracing;
use huddle_server::CallMailbox;
use serde_json::json;

#[tokio::test]
async fn offer_survives_multiple_fetches() {
    init_tracing();
    let mailbox = CallMailbox::new();
    mailbox.publish("r1", json!({"type": "offer", "sdp": "v=0"}));

    // Room-scoped rendezvous, not a queue: every joiner polling the slot
    // sees the offer.
    for _ in 0..3 {
        let payload = mailbox.fetch("r1").expect("offer should persist");
        assert_eq!(payload["type"], "offer");
    }
}

#[tokio::test]
async fn last_publish_wins() {
    init_tracing();
    let mailbox = CallMailbox::new();
    mailbox.publish("r1", json!({"sdp": "stale"}));
    mailbox.publish("r1", json!({"sdp": "fresh"}));

    assert_eq!(mailbox.fetch("r1"), Some(json!({"sdp": "fresh"})));
}

#[tokio::test]
async fn rooms_are_isolated() {
    init_tracing();
    let mailbox = CallMailbox::new();
    mailbox.publish("r1", json!({"sdp": "for-r1"}));

    assert_eq!(mailbox.fetch("r2"), None);
}
