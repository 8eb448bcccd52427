use dashmap::DashMap;
use huddle_core::{ParticipantId, ServerMessage};
use tokio::sync::mpsc;
use tracing::debug;

/// Live connections: participant id -> outbound message channel. Entries
/// are added on WebSocket accept and removed when the socket closes.
#[derive(Default)]
pub struct ConnectionRegistry {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: ParticipantId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.peers.insert(id, tx);
    }

    pub fn remove(&self, id: &ParticipantId) {
        self.peers.remove(id);
    }

    pub fn is_connected(&self, id: &ParticipantId) -> bool {
        self.peers.contains_key(id)
    }

    /// Deliver `message` to `id` if it has a live connection. Returns
    /// whether delivery was handed to the connection's channel.
    pub fn send_to(&self, id: &ParticipantId, message: ServerMessage) -> bool {
        match self.peers.get(id) {
            Some(tx) => tx.send(message).is_ok(),
            None => {
                debug!("No live connection for {id}");
                false
            }
        }
    }
}
