use crate::presence::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Both presence backings refused the operation. Fatal for the single
    /// operation, never for the process.
    #[error("presence store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Required join fields missing or empty. The request is ignored and no
    /// state is mutated.
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),
}
