//! Upload error types.

use vodup_protocol::ProtocolError;
use vodup_transfer::TransferError;

use crate::types::UploadPhase;

/// Errors that abort an upload attempt.
///
/// Rejected control signals (pause/resume/stop in the wrong state) are not
/// errors; those methods return `false`.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no authentication token configured")]
    AuthenticationMissing,

    #[error("malformed response: {0}")]
    ProtocolResponseMalformed(String),

    #[error("{phase} rejected with HTTP {status}: {body}")]
    TransferRejected {
        phase: UploadPhase,
        status: u16,
        body: String,
    },

    #[error("an upload is already in progress")]
    UploadInProgress,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer error: {0}")]
    Transfer(TransferError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::AuthenticationMissing => Self::AuthenticationMissing,
            TransferError::SessionActive => Self::UploadInProgress,
            TransferError::Io(e) => Self::Io(e),
            other => Self::Transfer(other),
        }
    }
}
