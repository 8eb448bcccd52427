use async_trait::async_trait;
use huddle_core::{Participant, ParticipantId, Role, ServerMessage};
use huddle_server::presence::{MemoryBacking, PresenceBacking, StoreError};
use huddle_server::signaling::ConnectionRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

pub fn participant(id: &ParticipantId, room: &str, name: &str, role: Role) -> Participant {
    Participant {
        id: id.clone(),
        name: name.to_string(),
        role,
        room_id: room.to_string(),
    }
}

/// Register a simulated connection and return the broadcast receiver.
pub fn connect(
    registry: &ConnectionRegistry,
) -> (ParticipantId, mpsc::UnboundedReceiver<ServerMessage>) {
    let id = ParticipantId::new();
    let (tx, rx) = mpsc::unbounded_channel();
    registry.add(id.clone(), tx);
    (id, rx)
}

/// Drain everything currently queued and return the last membership
/// broadcast, if any.
pub fn last_roster(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Option<Vec<String>> {
    let mut roster = None;
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::RoomUsers(members) = msg {
            roster = Some(members.into_iter().map(|m| m.name).collect());
        }
    }
    roster
}

/// Fault-injectable durable backing: delegates to an in-memory store until
/// told to fail, then errors on every call.
pub struct FailingBacking {
    inner: MemoryBacking,
    failing: AtomicBool,
}

impl FailingBacking {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryBacking::new(),
            failing: AtomicBool::new(false),
        })
    }

    pub fn start_failing(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn stop_failing(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// Peek at the durable state directly, bypassing the store.
    pub async fn raw_members(&self, room_id: &str) -> Vec<Participant> {
        self.inner.members(room_id).await.unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected fault".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PresenceBacking for FailingBacking {
    async fn join(&self, room_id: &str, p: Participant) -> Result<(), StoreError> {
        self.check()?;
        self.inner.join(room_id, p).await
    }

    async fn leave(&self, room_id: &str, id: &ParticipantId) -> Result<(), StoreError> {
        self.check()?;
        self.inner.leave(room_id, id).await
    }

    async fn remove_participant(
        &self,
        id: &ParticipantId,
    ) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.remove_participant(id).await
    }

    async fn members(&self, room_id: &str) -> Result<Vec<Participant>, StoreError> {
        self.check()?;
        self.inner.members(room_id).await
    }
}
