use huddle_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Send attempted on a link that is not `Connected`. Recoverable: wait
    /// for the connection and retry. Nothing is queued.
    #[error("peer link to {0} is not connected")]
    NotReady(ParticipantId),

    /// Local capture device unavailable. Fatal for starting a call on this
    /// client; surfaced to the user, not retried automatically.
    #[error("local media unavailable")]
    MediaAcquisitionFailed,

    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}
