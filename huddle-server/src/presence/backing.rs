use async_trait::async_trait;
use huddle_core::{Participant, ParticipantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("presence backing unavailable: {0}")]
    Unavailable(String),
}

/// One of the two interchangeable stores behind [`PresenceStore`]: the
/// durable backing is shared across server processes, the local backing is
/// scoped to this process. The store decides which one is active.
///
/// [`PresenceStore`]: crate::presence::PresenceStore
#[async_trait]
pub trait PresenceBacking: Send + Sync {
    /// Register `participant` in `room_id`. Must be idempotent per
    /// participant id: a repeated join refreshes metadata, never duplicates
    /// a member.
    async fn join(&self, room_id: &str, participant: Participant) -> Result<(), StoreError>;

    /// Remove `participant_id` from `room_id`. No-op if absent.
    async fn leave(&self, room_id: &str, participant_id: &ParticipantId)
    -> Result<(), StoreError>;

    /// Ungraceful-disconnect path: find whichever room the participant was
    /// in, leave it, and report the room id.
    async fn remove_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<String>, StoreError>;

    /// Current members of `room_id`, in join order.
    async fn members(&self, room_id: &str) -> Result<Vec<Participant>, StoreError>;
}
