//! Wire protocol types for the VOD asset API and its object store.
//!
//! JSON bodies of the asset API live in [`messages`] and [`types`]; the
//! object store's XML envelopes are handled by [`envelope`]; signed URL
//! assembly is in [`urls`].

pub mod envelope;
pub mod messages;
pub mod types;
pub mod urls;

// Re-export primary types for convenience.
pub use envelope::{build_complete_manifest, extract_upload_id, parse_list_parts};
pub use messages::{
    AssetStatus, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest, HttpVerb,
    SignedAuthorization,
};
pub use types::{AssetDescriptor, PartEntry, ProgressInfo, TransferStatus, UploadTarget};

/// Errors produced while decoding protocol bodies.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid part number: {0}")]
    InvalidPartNumber(String),
}
