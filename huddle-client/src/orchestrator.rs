use crate::error::ClientError;
use crate::link::{LinkState, NegotiationRole, PeerLink};
use crate::transport::{MediaTrack, TransportEvent, TransportFactory};
use bytes::Bytes;
use huddle_core::{MemberInfo, ParticipantId, ServerMessage, SignalEnvelope, SignalKind};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::track::track_remote::TrackRemote;

/// Events surfaced to the presentation layer.
pub enum PeerEvent {
    /// Fresh membership snapshot for the room, in join order.
    Roster(Vec<MemberInfo>),
    LinkStateChanged {
        remote: ParticipantId,
        state: LinkState,
    },
    Message {
        from: ParticipantId,
        text: String,
    },
    RemoteTrack {
        from: ParticipantId,
        track: Arc<TrackRemote>,
    },
}

/// Per-client negotiation engine: one [`PeerLink`] per remote participant,
/// driven by membership broadcasts, relayed envelopes, and transport events.
///
/// All methods take `&mut self`, so every transition across this client's
/// links is serialized; the links share the local media source and that is
/// the one piece of state they must not race on.
pub struct PeerConnectionOrchestrator {
    local_id: ParticipantId,
    links: HashMap<ParticipantId, PeerLink>,
    factory: Box<dyn TransportFactory>,
    transport_tx: mpsc::Sender<(ParticipantId, TransportEvent)>,
    signal_tx: mpsc::UnboundedSender<SignalEnvelope>,
    event_tx: mpsc::UnboundedSender<PeerEvent>,
    camera_video: Option<MediaTrack>,
    camera_audio: Option<MediaTrack>,
    screen_video: Option<MediaTrack>,
}

impl PeerConnectionOrchestrator {
    /// Returns the orchestrator plus the receiver for transport events; the
    /// embedder pumps those back through [`handle_transport_event`].
    ///
    /// [`handle_transport_event`]: Self::handle_transport_event
    pub fn new(
        local_id: ParticipantId,
        factory: Box<dyn TransportFactory>,
        signal_tx: mpsc::UnboundedSender<SignalEnvelope>,
        event_tx: mpsc::UnboundedSender<PeerEvent>,
    ) -> (Self, mpsc::Receiver<(ParticipantId, TransportEvent)>) {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        (
            Self {
                local_id,
                links: HashMap::new(),
                factory,
                transport_tx,
                signal_tx,
                event_tx,
                camera_video: None,
                camera_audio: None,
                screen_video: None,
            },
            transport_rx,
        )
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    pub fn link_state(&self, remote: &ParticipantId) -> Option<LinkState> {
        self.links.get(remote).map(PeerLink::state)
    }

    /// Hand over the captured local tracks. Passing neither track is the
    /// capture-failed case: fatal for starting a call on this client,
    /// surfaced to the caller, never retried here.
    pub fn start_call_media(
        &mut self,
        video: Option<MediaTrack>,
        audio: Option<MediaTrack>,
    ) -> Result<(), ClientError> {
        if video.is_none() && audio.is_none() {
            return Err(ClientError::MediaAcquisitionFailed);
        }
        self.camera_video = video;
        self.camera_audio = audio;
        Ok(())
    }

    /// React to a membership snapshot: open links to newly visible remotes
    /// (when this side is the designated initiator) and tear down links to
    /// departed ones.
    ///
    /// Initiator rule: the participant whose id string sorts first creates
    /// the offer. Total and symmetric, so exactly one side offers.
    pub async fn apply_roster(&mut self, members: Vec<MemberInfo>) -> Result<(), ClientError> {
        let _ = self.event_tx.send(PeerEvent::Roster(members.clone()));

        let present: Vec<ParticipantId> = members
            .iter()
            .map(|m| m.id.clone())
            .filter(|id| *id != self.local_id)
            .collect();

        let departed: Vec<ParticipantId> = self
            .links
            .keys()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        for remote in departed {
            info!("Remote {remote} left the room; closing link");
            self.close_link(&remote).await;
        }

        for remote in present {
            if self.links.contains_key(&remote) {
                continue;
            }
            if self.local_id.to_string() < remote.to_string() {
                self.initiate(remote).await?;
            }
            // Otherwise the remote sorts first and will send us an offer.
        }
        Ok(())
    }

    /// Handle a relayed negotiation envelope addressed to this client.
    pub async fn handle_signal(
        &mut self,
        kind: SignalKind,
        from: ParticipantId,
        payload: serde_json::Value,
    ) -> Result<(), ClientError> {
        match kind {
            SignalKind::Offer => self.handle_offer(from, payload).await,
            SignalKind::Answer => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("Answer from {from} with no link; dropping");
                    return Ok(());
                };
                let Some(sdp) = payload.get("sdp").and_then(|v| v.as_str()) else {
                    warn!("Answer from {from} without sdp; dropping");
                    return Ok(());
                };
                link.apply_answer(sdp.to_string()).await
            }
            SignalKind::IceCandidate => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("Candidate from {from} with no link; dropping");
                    return Ok(());
                };
                link.add_candidate(payload).await
            }
        }
    }

    async fn handle_offer(
        &mut self,
        from: ParticipantId,
        payload: serde_json::Value,
    ) -> Result<(), ClientError> {
        if self
            .links
            .get(&from)
            .is_some_and(|l| l.state() != LinkState::Closed)
        {
            debug!("Offer from {from} but a link already exists; dropping");
            return Ok(());
        }
        let Some(sdp) = payload.get("sdp").and_then(|v| v.as_str()).map(String::from) else {
            warn!("Offer from {from} without sdp; dropping");
            return Ok(());
        };

        self.create_link(from.clone()).await?;
        let Some(link) = self.links.get_mut(&from) else {
            return Ok(());
        };
        let answer = link.accept_offer(sdp).await?;
        self.emit_state(&from, LinkState::Negotiating(NegotiationRole::Answering));
        self.send_signal(SignalKind::Answer, from, json!({ "sdp": answer }));
        Ok(())
    }

    /// Pump one transport event back into the state machine.
    pub async fn handle_transport_event(&mut self, remote: ParticipantId, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                if let Some(link) = self.links.get_mut(&remote)
                    && link.mark_connected()
                {
                    info!("Link to {remote} connected");
                    self.emit_state(&remote, LinkState::Connected);
                }
            }
            TransportEvent::Disconnected => {
                info!("Transport to {remote} reported loss; closing link");
                self.close_link(&remote).await;
            }
            TransportEvent::Message(data) => match String::from_utf8(data.to_vec()) {
                Ok(text) => {
                    let _ = self.event_tx.send(PeerEvent::Message { from: remote, text });
                }
                Err(e) => warn!("Non-UTF8 message from {remote}: {e}"),
            },
            TransportEvent::CandidateReady(candidate) => {
                self.send_signal(SignalKind::IceCandidate, remote, candidate);
            }
            TransportEvent::RemoteTrack(track) => {
                let _ = self
                    .event_tx
                    .send(PeerEvent::RemoteTrack { from: remote, track });
            }
        }
    }

    /// Convenience wrapper for driving the orchestrator straight from the
    /// signaling socket.
    pub async fn handle_server_message(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        match message {
            ServerMessage::Welcome { id, .. } => {
                debug!("Welcome for {id}");
                Ok(())
            }
            ServerMessage::RoomUsers(members) => self.apply_roster(members).await,
            ServerMessage::Signal {
                kind,
                from,
                payload,
            } => self.handle_signal(kind, from, payload).await,
        }
    }

    /// Send a chat message to one remote. Only honored on a `Connected`
    /// link; otherwise fails locally with `NotReady` and queues nothing.
    pub async fn send_chat(&self, remote: &ParticipantId, text: &str) -> Result<(), ClientError> {
        let Some(link) = self.links.get(remote) else {
            return Err(ClientError::NotReady(remote.clone()));
        };
        link.send(Bytes::from(text.as_bytes().to_vec())).await
    }

    pub async fn toggle_audio(&mut self, enabled: bool) -> Result<(), ClientError> {
        for link in self.links.values() {
            if link.state() != LinkState::Closed {
                link.transport().set_audio_enabled(enabled).await?;
            }
        }
        Ok(())
    }

    pub async fn toggle_video(&mut self, enabled: bool) -> Result<(), ClientError> {
        for link in self.links.values() {
            if link.state() != LinkState::Closed {
                link.transport().set_video_enabled(enabled).await?;
            }
        }
        Ok(())
    }

    /// Substitute the outbound video with a screen-capture track on every
    /// connected link. A local substitution only: no teardown, no
    /// renegotiation.
    pub async fn start_screen_share(&mut self, track: MediaTrack) -> Result<(), ClientError> {
        for link in self.links.values() {
            if link.state() == LinkState::Connected {
                link.transport().replace_video_track(track.clone()).await?;
            }
        }
        self.screen_video = Some(track);
        Ok(())
    }

    pub async fn stop_screen_share(&mut self) -> Result<(), ClientError> {
        self.end_screen_share().await
    }

    /// The capture ended underneath us (user closed the shared window).
    /// Runs the exact same restoration path as an explicit stop.
    pub async fn notify_share_ended(&mut self) -> Result<(), ClientError> {
        self.end_screen_share().await
    }

    async fn end_screen_share(&mut self) -> Result<(), ClientError> {
        if self.screen_video.take().is_none() {
            return Ok(());
        }
        let Some(camera) = self.camera_video.clone() else {
            return Ok(());
        };
        for link in self.links.values() {
            if link.state() == LinkState::Connected {
                link.transport().replace_video_track(camera.clone()).await?;
            }
        }
        Ok(())
    }

    /// Leave the call: drive every link to `Closed`.
    pub async fn leave(&mut self) {
        let remotes: Vec<ParticipantId> = self.links.keys().cloned().collect();
        for remote in remotes {
            self.close_link(&remote).await;
        }
    }

    async fn initiate(&mut self, remote: ParticipantId) -> Result<(), ClientError> {
        info!("Initiating link to {remote}");
        self.create_link(remote.clone()).await?;
        let Some(link) = self.links.get_mut(&remote) else {
            return Ok(());
        };
        let sdp = link.start_offer().await?;
        self.emit_state(&remote, LinkState::Negotiating(NegotiationRole::Offering));
        self.send_signal(SignalKind::Offer, remote, json!({ "sdp": sdp }));
        Ok(())
    }

    async fn create_link(&mut self, remote: ParticipantId) -> Result<(), ClientError> {
        self.links.remove(&remote);
        let transport = self
            .factory
            .create(
                remote.clone(),
                self.outbound_tracks(),
                self.transport_tx.clone(),
            )
            .await?;
        self.links
            .insert(remote.clone(), PeerLink::new(remote, transport));
        Ok(())
    }

    fn outbound_tracks(&self) -> Vec<MediaTrack> {
        let video = self.screen_video.clone().or_else(|| self.camera_video.clone());
        video
            .into_iter()
            .chain(self.camera_audio.clone())
            .collect()
    }

    async fn close_link(&mut self, remote: &ParticipantId) {
        if let Some(mut link) = self.links.remove(remote) {
            link.close().await;
            self.emit_state(remote, LinkState::Closed);
        }
    }

    fn emit_state(&self, remote: &ParticipantId, state: LinkState) {
        let _ = self.event_tx.send(PeerEvent::LinkStateChanged {
            remote: remote.clone(),
            state,
        });
    }

    fn send_signal(&self, kind: SignalKind, to: ParticipantId, payload: serde_json::Value) {
        let _ = self.signal_tx.send(SignalEnvelope {
            kind,
            from: self.local_id.clone(),
            to,
            payload,
        });
    }
}
