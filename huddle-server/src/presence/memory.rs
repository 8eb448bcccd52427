use crate::presence::backing::{PresenceBacking, StoreError};
use async_trait::async_trait;
use huddle_core::{Participant, ParticipantId};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct MemoryState {
    /// room id -> member ids, in join order.
    rooms: HashMap<String, Vec<ParticipantId>>,
    participants: HashMap<ParticipantId, Participant>,
}

/// Process-local backing. Never fails; used directly when no durable
/// backing is configured and as the fallback after the breaker trips.
#[derive(Default)]
pub struct MemoryBacking {
    state: Mutex<MemoryState>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceBacking for MemoryBacking {
    async fn join(&self, room_id: &str, participant: Participant) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        // A participant id lives in at most one room. A re-join for the
        // same room only refreshes metadata and keeps the original slot.
        let old_room = state
            .participants
            .get(&participant.id)
            .filter(|previous| previous.room_id != room_id)
            .map(|previous| previous.room_id.clone());
        if let Some(old_room) = old_room {
            detach(&mut state, &old_room, &participant.id);
        }

        let order = state.rooms.entry(room_id.to_string()).or_default();
        if !order.contains(&participant.id) {
            order.push(participant.id.clone());
        }
        state.participants.insert(participant.id.clone(), participant);
        Ok(())
    }

    async fn leave(
        &self,
        room_id: &str,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        detach(&mut state, room_id, participant_id);
        if state
            .participants
            .get(participant_id)
            .is_some_and(|p| p.room_id == room_id)
        {
            state.participants.remove(participant_id);
        }
        Ok(())
    }

    async fn remove_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(participant) = state.participants.remove(participant_id) else {
            return Ok(None);
        };
        let room_id = participant.room_id;
        detach(&mut state, &room_id, participant_id);
        Ok(Some(room_id))
    }

    async fn members(&self, room_id: &str) -> Result<Vec<Participant>, StoreError> {
        let state = self.state.lock().await;
        let Some(order) = state.rooms.get(room_id) else {
            return Ok(Vec::new());
        };
        Ok(order
            .iter()
            .filter_map(|id| state.participants.get(id).cloned())
            .collect())
    }
}

fn detach(state: &mut MemoryState, room_id: &str, participant_id: &ParticipantId) {
    if let Some(order) = state.rooms.get_mut(room_id) {
        order.retain(|id| id != participant_id);
        if order.is_empty() {
            state.rooms.remove(room_id);
        }
    }
}
