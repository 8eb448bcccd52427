use crate::transport::{MediaTrack, PeerTransport, TransportEvent, TransportFactory};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::{IceServerConfig, ParticipantId};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;

/// Native [`PeerTransport`] over webrtc-rs. One instance per remote peer.
pub struct RtcTransport {
    remote: ParticipantId,
    pc: Arc<RTCPeerConnection>,
    events: mpsc::Sender<(ParticipantId, TransportEvent)>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    video_sender: Option<Arc<RTCRtpSender>>,
    audio_sender: Option<Arc<RTCRtpSender>>,
    current_video: Mutex<Option<MediaTrack>>,
    current_audio: Mutex<Option<MediaTrack>>,
}

impl RtcTransport {
    async fn new(
        remote: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
        initial_tracks: Vec<MediaTrack>,
        events: mpsc::Sender<(ParticipantId, TransportEvent)>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Liveness: the remote closing or the path failing must drive the
        // link to Closed without waiting for a courtesy leave broadcast.
        let state_tx = events.clone();
        let state_remote = remote.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let remote = state_remote.clone();
            Box::pin(async move {
                debug!("Peer connection state for {remote}: {state:?}");
                match state {
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = tx.send((remote, TransportEvent::Disconnected)).await;
                    }
                    _ => {}
                }
            })
        }));

        // Trickle ICE: hand every local candidate to the orchestrator for
        // relaying.
        let ice_tx = events.clone();
        let ice_remote = remote.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let remote = ice_remote.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx
                    .send((remote, TransportEvent::CandidateReady(value)))
                    .await;
            })
        }));

        let track_tx = events.clone();
        let track_remote_id = remote.clone();
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let remote = track_remote_id.clone();
            Box::pin(async move {
                debug!("Remote track from {remote}: {}", track.id());
                let _ = tx.send((remote, TransportEvent::RemoteTrack(track))).await;
            })
        }));

        // Answering side: the offerer opens the channel, we adopt it here.
        let data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));
        let dc_slot = data_channel.clone();
        let dc_tx = events.clone();
        let dc_remote = remote.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let slot = dc_slot.clone();
            let tx = dc_tx.clone();
            let remote = dc_remote.clone();
            Box::pin(async move {
                attach_data_channel(&dc, remote, tx);
                *slot.lock().await = Some(dc);
            })
        }));

        let mut video_sender = None;
        let mut audio_sender = None;
        let mut current_video = None;
        let mut current_audio = None;
        for track in initial_tracks {
            let kind = track.kind();
            let sender = pc.add_track(track.clone()).await?;
            match kind {
                RTPCodecType::Video => {
                    video_sender = Some(sender);
                    current_video = Some(track);
                }
                RTPCodecType::Audio => {
                    audio_sender = Some(sender);
                    current_audio = Some(track);
                }
                RTPCodecType::Unspecified => {}
            }
        }

        Ok(Self {
            remote,
            pc,
            events,
            data_channel,
            video_sender,
            audio_sender,
            current_video: Mutex::new(current_video),
            current_audio: Mutex::new(current_audio),
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String> {
        let dc = self
            .pc
            .create_data_channel("chat", None)
            .await
            .context("Failed to create data channel")?;
        attach_data_channel(&dc, self.remote.clone(), self.events.clone());
        *self.data_channel.lock().await = Some(dc);

        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.pc.set_remote_description(offer).await?;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.pc.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: serde_json::Value) -> Result<()> {
        let init: RTCIceCandidateInit =
            serde_json::from_value(candidate).context("Failed to parse ICE candidate")?;
        self.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        let Some(dc) = self.data_channel.lock().await.clone() else {
            bail!("Data channel to {} not open", self.remote);
        };
        dc.send(&data).await.context("Failed to send on data channel")?;
        Ok(())
    }

    async fn replace_video_track(&self, track: MediaTrack) -> Result<()> {
        let Some(sender) = &self.video_sender else {
            debug!("No video sender for {}; ignoring track swap", self.remote);
            return Ok(());
        };
        sender.replace_track(Some(track.clone())).await?;
        *self.current_video.lock().await = Some(track);
        Ok(())
    }

    async fn set_audio_enabled(&self, enabled: bool) -> Result<()> {
        let Some(sender) = &self.audio_sender else {
            return Ok(());
        };
        let track = if enabled {
            self.current_audio.lock().await.clone()
        } else {
            None
        };
        sender.replace_track(track).await?;
        Ok(())
    }

    async fn set_video_enabled(&self, enabled: bool) -> Result<()> {
        let Some(sender) = &self.video_sender else {
            return Ok(());
        };
        let track = if enabled {
            self.current_video.lock().await.clone()
        } else {
            None
        };
        sender.replace_track(track).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

fn attach_data_channel(
    dc: &Arc<RTCDataChannel>,
    remote: ParticipantId,
    events: mpsc::Sender<(ParticipantId, TransportEvent)>,
) {
    let open_tx = events.clone();
    let open_remote = remote.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let remote = open_remote.clone();
        Box::pin(async move {
            debug!("Data channel to {remote} open");
            let _ = tx.send((remote, TransportEvent::Connected)).await;
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = events.clone();
        let remote = remote.clone();
        Box::pin(async move {
            let data = Bytes::from(msg.data.to_vec());
            let _ = tx.send((remote, TransportEvent::Message(data))).await;
        })
    }));
}

/// Creates one [`RtcTransport`] per remote, all sharing the ICE server list
/// the server handed out at connect.
pub struct RtcTransportFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcTransportFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        remote: ParticipantId,
        initial_tracks: Vec<MediaTrack>,
        events: mpsc::Sender<(ParticipantId, TransportEvent)>,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport =
            RtcTransport::new(remote, self.ice_servers.clone(), initial_tracks, events).await?;
        Ok(Box::new(transport))
    }
}
