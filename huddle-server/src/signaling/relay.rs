use crate::signaling::registry::ConnectionRegistry;
use huddle_core::{ServerMessage, SignalEnvelope};
use std::sync::Arc;
use tracing::debug;

/// Stateless forwarder for negotiation envelopes.
///
/// Delivery is at-most-once and fire-and-forget: if the target has no live
/// connection the envelope is dropped and the sender is not notified.
/// Retries, where needed, belong to the negotiation state machine on the
/// client, not here.
#[derive(Clone)]
pub struct SignalingRelay {
    registry: Arc<ConnectionRegistry>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn relay(&self, envelope: SignalEnvelope) {
        let SignalEnvelope {
            kind,
            from,
            to,
            payload,
        } = envelope;

        let delivered = self.registry.send_to(
            &to,
            ServerMessage::Signal {
                kind,
                from: from.clone(),
                payload,
            },
        );
        if !delivered {
            debug!("Dropped {kind:?} from {from}: target {to} not connected");
        }
    }
}
