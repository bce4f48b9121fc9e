//! Resumable chunked upload of video assets.
//!
//! This crate implements the upload flow against a VOD service: register an
//! asset, open a multipart session on its object store, upload the source
//! chunk by chunk, then merge and confirm. It has no transport dependency;
//! the HTTP client crate provides the [`RemoteProtocolClient`]
//! implementation.
//!
//! # Pipeline
//!
//! 1. **Register**: create the asset and learn its bucket/object
//! 2. **Initiate**: sign and open the multipart session
//! 3. **Chunks**: sign and PUT each chunk with its `Content-MD5`
//! 4. **Finalize**: list the accepted parts and merge them
//! 5. **Confirm**: mark the asset as uploaded
//!
//! Pause, resume and stop are honoured between chunks.

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod types;
pub mod uploader;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use client::{ClientFuture, RemoteProtocolClient, TransferProgressFn};
pub use error::UploadError;
pub use orchestrator::{ChunkLoopOutcome, UploadOrchestrator};
pub use types::{UploadOptions, UploadPhase, UploaderConfig};
pub use uploader::VodUploader;

pub use vodup_protocol::{AssetDescriptor, ProgressInfo, TransferStatus};
pub use vodup_transfer::{ChunkSource, FileSource, MemorySource, ProgressCallback};
