//! Chunked multipart upload building blocks.
//!
//! Chunk planning and sources live in [`chunked`], per-chunk digests in
//! [`digest`], resumable session state in [`session`], the pause/resume
//! state machine in [`state`] and progress aggregation in [`progress`].

mod chunked;
mod digest;
mod progress;
mod session;
mod state;

pub use chunked::{ChunkPlan, ChunkSource, ChunkSpan, FileSource, MemorySource, ReadFuture};
pub use digest::{ChunkDigestEngine, Md5Base64, content_md5};
pub use progress::{ProgressAggregator, ProgressCallback, ProgressReporter, percent_of};
pub use session::SessionState;
pub use state::TransferStateMachine;

/// Default chunk size: 100 MiB. Each chunk is held in memory while sent.
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("source needs {0} chunks, more than a part number can address")]
    TooManyChunks(u64),

    #[error("range {start}..{end} outside source of {len} bytes")]
    ChunkOutOfRange { start: u64, end: u64, len: u64 },

    #[error("part {got} recorded out of order, expected {expected}")]
    PartOutOfOrder { expected: u32, got: u32 },

    #[error("an upload session is already active")]
    SessionActive,

    #[error("no authentication token configured")]
    AuthenticationMissing,
}
