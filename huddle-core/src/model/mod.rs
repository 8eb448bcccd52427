mod participant;
mod signaling;
mod wire;

pub use participant::{Participant, ParticipantId, Role};
pub use signaling::{IceServerConfig, SignalEnvelope, SignalKind};
pub use wire::{ClientMessage, MemberInfo, ServerMessage};
