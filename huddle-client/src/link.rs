use crate::error::ClientError;
use crate::transport::PeerTransport;
use anyhow::Result;
use bytes::Bytes;
use huddle_core::ParticipantId;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offering,
    Answering,
}

/// Coarse link state. `Closed` is terminal: a remote that reappears later
/// gets a fresh link starting from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Negotiating(NegotiationRole),
    Connected,
    Closed,
}

/// One negotiated connection between the local client and one remote
/// participant. Candidate envelopes arriving before the remote description
/// is applied are buffered here and flushed afterwards; they never change
/// the coarse state.
pub struct PeerLink {
    remote: ParticipantId,
    state: LinkState,
    transport: Box<dyn PeerTransport>,
    pending_candidates: Vec<serde_json::Value>,
    remote_description_set: bool,
}

impl PeerLink {
    pub fn new(remote: ParticipantId, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            remote,
            state: LinkState::Idle,
            transport,
            pending_candidates: Vec::new(),
            remote_description_set: false,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// `Idle -> Negotiating(Offering)`: produce the local offer.
    pub async fn start_offer(&mut self) -> Result<String, ClientError> {
        let sdp = self.transport.create_offer().await?;
        self.state = LinkState::Negotiating(NegotiationRole::Offering);
        Ok(sdp)
    }

    /// `Idle -> Negotiating(Answering)`: apply the remote offer, produce the
    /// local answer.
    pub async fn accept_offer(&mut self, sdp: String) -> Result<String, ClientError> {
        let answer = self.transport.accept_offer(sdp).await?;
        self.state = LinkState::Negotiating(NegotiationRole::Answering);
        self.remote_description_set = true;
        self.flush_candidates().await?;
        Ok(answer)
    }

    pub async fn apply_answer(&mut self, sdp: String) -> Result<(), ClientError> {
        self.transport.apply_answer(sdp).await?;
        self.remote_description_set = true;
        self.flush_candidates().await?;
        Ok(())
    }

    pub async fn add_candidate(&mut self, candidate: serde_json::Value) -> Result<(), ClientError> {
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return Ok(());
        }
        self.transport.add_remote_candidate(candidate).await?;
        Ok(())
    }

    async fn flush_candidates(&mut self) -> Result<()> {
        for candidate in self.pending_candidates.drain(..) {
            self.transport.add_remote_candidate(candidate).await?;
        }
        Ok(())
    }

    /// Transport reported established connectivity. Ignored on a link that
    /// was already closed.
    pub fn mark_connected(&mut self) -> bool {
        if self.state == LinkState::Closed {
            return false;
        }
        self.state = LinkState::Connected;
        true
    }

    /// Honored only in `Connected`; in any other state fails locally with
    /// `NotReady` and has no side effect.
    pub async fn send(&self, data: Bytes) -> Result<(), ClientError> {
        if self.state != LinkState::Connected {
            return Err(ClientError::NotReady(self.remote.clone()));
        }
        self.transport.send(data).await?;
        Ok(())
    }

    pub fn transport(&self) -> &dyn PeerTransport {
        self.transport.as_ref()
    }

    /// Any state -> `Closed`. Closing an already-closed link is a no-op.
    pub async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.state = LinkState::Closed;
        if let Err(e) = self.transport.close().await {
            debug!("Closing transport to {}: {e}", self.remote);
        }
    }
}
