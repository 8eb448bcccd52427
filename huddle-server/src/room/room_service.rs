use crate::error::ServerError;
use crate::presence::PresenceStore;
use crate::signaling::ConnectionRegistry;
use dashmap::DashMap;
use huddle_core::{MemberInfo, Participant, ParticipantId, Role, ServerMessage};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Process-facing API for room membership: join, leave, ungraceful
/// disconnect, each followed by a full-snapshot membership broadcast.
///
/// A per-room mutex serializes the mutate+broadcast pair so no client ever
/// observes a partially-updated member list. Different rooms do not contend.
pub struct RoomService {
    store: PresenceStore,
    registry: Arc<ConnectionRegistry>,
    room_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RoomService {
    pub fn new(store: PresenceStore, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            store,
            registry,
            room_locks: DashMap::new(),
        }
    }

    fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Register the participant and broadcast the updated membership.
    /// Idempotent per connection id: a repeated join refreshes metadata.
    pub async fn on_join(
        &self,
        connection_id: ParticipantId,
        room_id: &str,
        name: &str,
        role: Role,
    ) -> Result<(), ServerError> {
        if room_id.is_empty() {
            return Err(ServerError::MalformedRequest("empty roomId"));
        }
        if name.is_empty() {
            return Err(ServerError::MalformedRequest("empty username"));
        }

        let lock = self.room_lock(room_id);
        let _guard = lock.lock().await;

        self.store
            .join(
                room_id,
                Participant {
                    id: connection_id.clone(),
                    name: name.to_string(),
                    role,
                    room_id: room_id.to_string(),
                },
            )
            .await?;
        info!("{name} ({role:?}) joined {room_id} as {connection_id}");

        self.broadcast_members(room_id).await?;
        Ok(())
    }

    /// Remove the participant and broadcast. No-op for non-members.
    pub async fn on_leave(
        &self,
        connection_id: &ParticipantId,
        room_id: &str,
    ) -> Result<(), ServerError> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().await;

        self.store.leave(room_id, connection_id).await?;
        info!("{connection_id} left {room_id}");

        self.broadcast_members(room_id).await?;
        Ok(())
    }

    /// Ungraceful-disconnect path. Safe to call after an explicit leave.
    pub async fn on_disconnect(&self, connection_id: &ParticipantId) -> Result<(), ServerError> {
        let Some(room_id) = self.store.remove_participant(connection_id).await? else {
            return Ok(());
        };
        info!("{connection_id} disconnected from {room_id}");

        let lock = self.room_lock(&room_id);
        let _guard = lock.lock().await;
        self.broadcast_members(&room_id).await?;
        Ok(())
    }

    /// Current members of a room, in join order.
    pub async fn members(&self, room_id: &str) -> Result<Vec<MemberInfo>, ServerError> {
        Ok(self
            .store
            .members(room_id)
            .await?
            .into_iter()
            .map(|p| MemberInfo {
                id: p.id,
                name: p.name,
                role: p.role,
            })
            .collect())
    }

    /// Deliver the membership snapshot to every current member. Snapshot
    /// replace, never diffs: client reconciliation is a plain replace.
    async fn broadcast_members(&self, room_id: &str) -> Result<(), ServerError> {
        let members = self.members(room_id).await?;
        for member in &members {
            self.registry
                .send_to(&member.id, ServerMessage::RoomUsers(members.clone()));
        }
        Ok(())
    }
}
