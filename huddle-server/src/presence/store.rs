use crate::presence::backing::{PresenceBacking, StoreError};
use crate::presence::memory::MemoryBacking;
use crate::presence::selector::BackingSelector;
use huddle_core::{Participant, ParticipantId};
use std::sync::Arc;
use tracing::{error, warn};

/// Room membership state behind a breaker.
///
/// Every operation goes to the durable backing while the selector says it is
/// active; the first fault trips the selector and the same logical operation
/// is replayed against the local backing before returning, so callers never
/// observe durable faults as API failures. After the trip all traffic stays
/// local until restart. Membership recorded durably before the trip is not
/// merged back.
pub struct PresenceStore {
    durable: Option<Arc<dyn PresenceBacking>>,
    local: Arc<dyn PresenceBacking>,
    selector: Arc<BackingSelector>,
}

impl PresenceStore {
    pub fn new(durable: Option<Arc<dyn PresenceBacking>>, selector: Arc<BackingSelector>) -> Self {
        Self {
            durable,
            local: Arc::new(MemoryBacking::new()),
            selector,
        }
    }

    /// A store with no durable backing at all; everything is process-local.
    pub fn local_only() -> Self {
        Self::new(None, Arc::new(BackingSelector::new()))
    }

    fn active_durable(&self) -> Option<&Arc<dyn PresenceBacking>> {
        if self.selector.durable_active() {
            self.durable.as_ref()
        } else {
            None
        }
    }

    fn record_fault(&self, operation: &str, fault: &StoreError) {
        if self.selector.trip() {
            warn!(
                "Durable presence backing failed during {operation} ({fault}); \
                 switching to local backing until restart"
            );
        } else {
            error!("Durable presence backing failed during {operation} after trip: {fault}");
        }
    }

    pub async fn join(&self, room_id: &str, participant: Participant) -> Result<(), StoreError> {
        if let Some(durable) = self.active_durable() {
            match durable.join(room_id, participant.clone()).await {
                Ok(()) => return Ok(()),
                Err(fault) => self.record_fault("join", &fault),
            }
        }
        self.local.join(room_id, participant).await
    }

    pub async fn leave(
        &self,
        room_id: &str,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        if let Some(durable) = self.active_durable() {
            match durable.leave(room_id, participant_id).await {
                Ok(()) => return Ok(()),
                Err(fault) => self.record_fault("leave", &fault),
            }
        }
        self.local.leave(room_id, participant_id).await
    }

    pub async fn remove_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<String>, StoreError> {
        if let Some(durable) = self.active_durable() {
            match durable.remove_participant(participant_id).await {
                Ok(room) => return Ok(room),
                Err(fault) => self.record_fault("remove_participant", &fault),
            }
        }
        self.local.remove_participant(participant_id).await
    }

    pub async fn members(&self, room_id: &str) -> Result<Vec<Participant>, StoreError> {
        if let Some(durable) = self.active_durable() {
            match durable.members(room_id).await {
                Ok(members) => return Ok(members),
                Err(fault) => self.record_fault("members", &fault),
            }
        }
        self.local.members(room_id).await
    }
}
