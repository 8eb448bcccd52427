use crate::model::participant::{ParticipantId, Role};
use crate::model::signaling::{IceServerConfig, SignalEnvelope, SignalKind};
use serde::{Deserialize, Serialize};

/// Messages a connected client sends over the signaling socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        room_id: String,
        username: String,
        #[serde(default)]
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    Leave { room_id: String },
    Signal(SignalEnvelope),
}

/// Membership broadcast entry: the snapshot wire shape is an ordered list
/// of these, in join order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberInfo {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
}

/// Messages the server pushes to a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    /// Sent once on connect: the server-assigned connection id plus the ICE
    /// servers the client should negotiate with.
    #[serde(rename_all = "camelCase")]
    Welcome {
        id: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
    },
    RoomUsers(Vec<MemberInfo>),
    Signal {
        kind: SignalKind,
        from: ParticipantId,
        payload: serde_json::Value,
    },
}
