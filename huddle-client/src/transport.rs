use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// An outbound media track, shared between the local capture owner and the
/// per-peer transports.
pub type MediaTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Events a transport reports back to the orchestrator, tagged with the
/// remote participant they belong to on the shared channel.
pub enum TransportEvent {
    /// The reliable message channel is open; sends will be honored from now
    /// on. This, not ICE state alone, is what drives a link to `Connected`.
    Connected,
    /// Transport-level liveness failure or remote close. Emitted without
    /// relying on any courtesy leave message arriving.
    Disconnected,
    Message(Bytes),
    /// A locally gathered ICE candidate, ready to relay to the remote side.
    CandidateReady(serde_json::Value),
    RemoteTrack(Arc<TrackRemote>),
}

/// One peer connection, seen from the negotiation engine. The engine only
/// drives SDP/candidate plumbing and the message channel through this seam;
/// tests substitute a mock and never touch a network stack.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Offering side: open the message channel and produce the local offer.
    async fn create_offer(&self) -> Result<String>;

    /// Answering side: apply the remote offer and produce the local answer.
    async fn accept_offer(&self, sdp: String) -> Result<String>;

    /// Offering side: apply the remote answer.
    async fn apply_answer(&self, sdp: String) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: serde_json::Value) -> Result<()>;

    async fn send(&self, data: Bytes) -> Result<()>;

    /// Swap the outbound video track in place. Must not tear down or
    /// renegotiate the connection.
    async fn replace_video_track(&self, track: MediaTrack) -> Result<()>;

    /// Mute/unmute the outbound audio without renegotiation.
    async fn set_audio_enabled(&self, enabled: bool) -> Result<()>;

    /// Pause/resume the outbound video without renegotiation.
    async fn set_video_enabled(&self, enabled: bool) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Create a transport for one remote peer, carrying the client's current
    /// outbound tracks. Events go to the orchestrator's shared channel.
    async fn create(
        &self,
        remote: ParticipantId,
        initial_tracks: Vec<MediaTrack>,
        events: mpsc::Sender<(ParticipantId, TransportEvent)>,
    ) -> Result<Box<dyn PeerTransport>>;
}
