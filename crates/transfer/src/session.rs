use std::sync::Arc;

use vodup_protocol::{AssetDescriptor, PartEntry, UploadTarget};

use crate::TransferError;
use crate::chunked::{ChunkPlan, ChunkSource, ChunkSpan};

/// Resumable state of one in-flight multipart upload.
///
/// Owned by the orchestrator for the lifetime of a session. Dropping it
/// abandons the session; nothing else holds a copy to resume from.
pub struct SessionState {
    source: Arc<dyn ChunkSource>,
    asset: AssetDescriptor,
    content_type: String,
    upload_id: String,
    plan: ChunkPlan,
    next_part_number: u32,
    parts: Vec<PartEntry>,
    uploaded_bytes: u64,
}

impl SessionState {
    /// Creates the state for a freshly initiated multipart session.
    pub fn new(
        source: Arc<dyn ChunkSource>,
        asset: AssetDescriptor,
        content_type: impl Into<String>,
        upload_id: impl Into<String>,
        plan: ChunkPlan,
    ) -> Self {
        Self {
            source,
            asset,
            content_type: content_type.into(),
            upload_id: upload_id.into(),
            plan,
            next_part_number: 1,
            parts: Vec::new(),
            uploaded_bytes: 0,
        }
    }

    pub fn source(&self) -> &Arc<dyn ChunkSource> {
        &self.source
    }

    pub fn asset(&self) -> &AssetDescriptor {
        &self.asset
    }

    pub fn target(&self) -> &UploadTarget {
        &self.asset.target
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn file_size(&self) -> u64 {
        self.plan.file_size()
    }

    pub fn total_chunks(&self) -> u32 {
        self.plan.total_chunks()
    }

    /// Next part to attempt (1-based).
    pub fn next_part_number(&self) -> u32 {
        self.next_part_number
    }

    /// Parts accepted during this session, in upload order.
    pub fn parts(&self) -> &[PartEntry] {
        &self.parts
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    /// Returns `true` once every chunk has been accepted.
    pub fn is_exhausted(&self) -> bool {
        self.next_part_number > self.plan.total_chunks()
    }

    /// Span of the next chunk to upload, if any remain.
    pub fn next_span(&self) -> Option<ChunkSpan> {
        self.plan.span(self.next_part_number)
    }

    /// Records an accepted chunk and advances the cursor past it.
    ///
    /// Parts are accepted strictly in order: a `span` other than the one the
    /// cursor points at is rejected and nothing is recorded.
    pub fn record_part(
        &mut self,
        span: ChunkSpan,
        digest: impl Into<String>,
    ) -> Result<(), TransferError> {
        if self.next_span() != Some(span) {
            return Err(TransferError::PartOutOfOrder {
                expected: self.next_part_number,
                got: span.part_number,
            });
        }
        self.parts.push(PartEntry {
            part_number: span.part_number,
            etag: digest.into(),
        });
        self.uploaded_bytes = self.uploaded_bytes.max(span.end);
        self.next_part_number += 1;
        Ok(())
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("source", &self.source.name())
            .field("asset_id", &self.asset.asset_id)
            .field("upload_id", &self.upload_id)
            .field("next_part_number", &self.next_part_number)
            .field("total_chunks", &self.plan.total_chunks())
            .field("parts", &self.parts.len())
            .field("uploaded_bytes", &self.uploaded_bytes)
            .finish()
    }
}
