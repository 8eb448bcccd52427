use crate::init_tracing;
use crate::utils::connect;
use huddle_core::{ParticipantId, ServerMessage, SignalEnvelope, SignalKind};
use huddle_server::signaling::{ConnectionRegistry, SignalingRelay};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn relay_delivers_to_live_target() {
    init_tracing();
    let registry = Arc::new(ConnectionRegistry::new());
    let relay = SignalingRelay::new(registry.clone());

    let (ann, _ann_rx) = connect(&registry);
    let (bob, mut bob_rx) = connect(&registry);

    relay.relay(SignalEnvelope {
        kind: SignalKind::Offer,
        from: ann.clone(),
        to: bob.clone(),
        payload: json!({"sdp": "v=0"}),
    });

    match bob_rx.try_recv() {
        Ok(ServerMessage::Signal {
            kind,
            from,
            payload,
        }) => {
            assert_eq!(kind, SignalKind::Offer);
            assert_eq!(from, ann);
            assert_eq!(payload["sdp"], "v=0");
        }
        other => panic!("expected relayed signal, got {other:?}"),
    }
}

#[tokio::test]
async fn relay_drops_silently_when_target_absent() {
    init_tracing();
    let registry = Arc::new(ConnectionRegistry::new());
    let relay = SignalingRelay::new(registry.clone());

    let (ann, mut ann_rx) = connect(&registry);

    // Completes without error and without any delivery.
    relay.relay(SignalEnvelope {
        kind: SignalKind::IceCandidate,
        from: ann.clone(),
        to: ParticipantId::new(),
        payload: json!({"candidate": "..."}),
    });

    assert!(ann_rx.try_recv().is_err(), "sender must not be notified");
}

#[tokio::test]
async fn relay_stops_delivering_after_target_disconnects() {
    init_tracing();
    let registry = Arc::new(ConnectionRegistry::new());
    let relay = SignalingRelay::new(registry.clone());

    let (ann, _ann_rx) = connect(&registry);
    let (bob, mut bob_rx) = connect(&registry);
    registry.remove(&bob);

    relay.relay(SignalEnvelope {
        kind: SignalKind::Answer,
        from: ann,
        to: bob,
        payload: json!({"sdp": "v=0"}),
    });

    assert!(bob_rx.try_recv().is_err());
}
