//! Phase sequencing for one upload attempt.
//!
//! Register → authorize initiation → initiate → chunk loop → list parts →
//! merge → confirm. The chunk loop is the only resumable part: it consults
//! the state machine before every chunk and suspends on pause without
//! releasing the session.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vodup_protocol::{
    AssetDescriptor, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest, PartEntry,
    TransferStatus, build_complete_manifest, extract_upload_id, urls,
};
use vodup_transfer::{
    ChunkDigestEngine, ChunkPlan, ChunkSource, ChunkSpan, ProgressReporter, SessionState,
    TransferStateMachine,
};

use crate::client::{RemoteProtocolClient, TransferProgressFn};
use crate::error::UploadError;
use crate::types::{UploadOptions, UploaderConfig};

/// How one pass of the chunk loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLoopOutcome {
    /// Every chunk was accepted.
    Completed,
    /// Suspended at a checkpoint; `manifest` holds the parts accepted so far.
    Paused { manifest: Vec<PartEntry> },
    /// Abandoned at a checkpoint.
    Stopped,
}

enum Checkpoint {
    Continue,
    Pause,
    Stop,
}

/// Drives one upload attempt against a [`RemoteProtocolClient`].
pub struct UploadOrchestrator<'a, C: ?Sized> {
    client: &'a C,
    state: &'a TransferStateMachine,
    progress: Arc<ProgressReporter>,
    digest: &'a dyn ChunkDigestEngine,
    config: &'a UploaderConfig,
}

impl<'a, C: RemoteProtocolClient + ?Sized> UploadOrchestrator<'a, C> {
    pub fn new(
        client: &'a C,
        state: &'a TransferStateMachine,
        progress: Arc<ProgressReporter>,
        digest: &'a dyn ChunkDigestEngine,
        config: &'a UploaderConfig,
    ) -> Self {
        Self {
            client,
            state,
            progress,
            digest,
            config,
        }
    }

    /// Runs every phase in order.
    ///
    /// Resolves to `None` when the attempt was stopped. Pauses are absorbed:
    /// the future waits until the status leaves `Paused` and continues from
    /// the session's next part.
    pub async fn run(
        &self,
        source: Arc<dyn ChunkSource>,
        options: &UploadOptions,
    ) -> Result<Option<AssetDescriptor>, UploadError> {
        let plan = ChunkPlan::new(source.len(), self.config.chunk_size)?;
        self.progress.set_plan(plan.file_size(), plan.total_chunks());

        let asset = self.register(&*source, options).await?;
        let upload_id = self.initiate(&asset, &options.content_type).await?;
        info!(
            asset_id = %asset.asset_id,
            upload_id = %upload_id,
            chunks = plan.total_chunks(),
            "multipart session opened"
        );

        let mut session = SessionState::new(
            source,
            asset,
            options.content_type.clone(),
            upload_id,
            plan,
        );

        loop {
            match self.upload_chunks(&mut session).await? {
                ChunkLoopOutcome::Completed => break,
                ChunkLoopOutcome::Stopped => {
                    info!(upload_id = %session.upload_id(), "upload abandoned");
                    return Ok(None);
                }
                ChunkLoopOutcome::Paused { manifest } => {
                    info!(
                        upload_id = %session.upload_id(),
                        next_part = session.next_part_number(),
                        parts = manifest.len(),
                        "upload paused"
                    );
                    if self.state.wait_while_paused().await != TransferStatus::Uploading {
                        info!(upload_id = %session.upload_id(), "upload abandoned while paused");
                        return Ok(None);
                    }
                    info!(
                        upload_id = %session.upload_id(),
                        next_part = session.next_part_number(),
                        "upload resumed"
                    );
                }
            }
        }

        let listed = self.list_remote_parts(&session).await?;
        if self.stopped() {
            info!(upload_id = %session.upload_id(), "upload abandoned before merge");
            return Ok(None);
        }
        self.merge(&session, &listed).await?;
        if self.stopped() {
            info!(upload_id = %session.upload_id(), "upload abandoned before confirm");
            return Ok(None);
        }
        self.confirm(session.asset()).await?;
        Ok(Some(session.asset().clone()))
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    async fn register(
        &self,
        source: &dyn ChunkSource,
        options: &UploadOptions,
    ) -> Result<AssetDescriptor, UploadError> {
        let req = CreateAssetRequest {
            title: options
                .title
                .clone()
                .unwrap_or_else(|| source.name().to_string()),
            video_name: source.name().to_string(),
            video_type: options.file_type.clone(),
            category_id: self.config.category_id.clone(),
            description: self.config.description.clone(),
        };
        debug!(phase = "register", title = %req.title, "registering asset");
        let asset = self.client.register_asset(&req).await?;
        debug!(
            asset_id = %asset.asset_id,
            bucket = %asset.target.bucket,
            object = %asset.target.object_key,
            "asset registered"
        );
        Ok(asset)
    }

    async fn initiate(
        &self,
        asset: &AssetDescriptor,
        content_type: &str,
    ) -> Result<String, UploadError> {
        debug!(phase = "initiate", "authorizing multipart initiation");
        let auth = self
            .client
            .authorize(&AuthorizationRequest::initiate(&asset.target, content_type))
            .await?;

        let object_url = self.client.object_url(&asset.target);
        let body = self
            .client
            .initiate_multipart(&urls::initiate_url(&object_url, &auth), content_type)
            .await?;

        extract_upload_id(&body)
            .map_err(|e| UploadError::ProtocolResponseMalformed(e.to_string()))?
            .ok_or_else(|| {
                UploadError::ProtocolResponseMalformed("initiate response has no UploadId".into())
            })
    }

    /// Finalize phases honour only a stop; a pause is overtaken by completion.
    fn stopped(&self) -> bool {
        matches!(self.checkpoint(), Checkpoint::Stop)
    }

    fn checkpoint(&self) -> Checkpoint {
        match self.state.status() {
            TransferStatus::Uploading => Checkpoint::Continue,
            TransferStatus::Paused => Checkpoint::Pause,
            _ => Checkpoint::Stop,
        }
    }

    /// Uploads chunks from the session's cursor until exhausted or a
    /// checkpoint says otherwise.
    ///
    /// A checkpoint also runs after the last chunk so a pause or stop issued
    /// while it was in flight is honoured before finalize.
    pub async fn upload_chunks(
        &self,
        session: &mut SessionState,
    ) -> Result<ChunkLoopOutcome, UploadError> {
        loop {
            let next = session.next_span();
            match self.checkpoint() {
                Checkpoint::Stop => return Ok(ChunkLoopOutcome::Stopped),
                Checkpoint::Pause => {
                    return Ok(ChunkLoopOutcome::Paused {
                        manifest: session.parts().to_vec(),
                    });
                }
                Checkpoint::Continue => {}
            }
            let Some(span) = next else {
                return Ok(ChunkLoopOutcome::Completed);
            };
            self.upload_chunk(session, span).await?;
        }
    }

    async fn upload_chunk(
        &self,
        session: &mut SessionState,
        span: ChunkSpan,
    ) -> Result<(), UploadError> {
        let data = session.source().read_range(span.range()).await?;
        let content_md5 = self.digest.digest(&data);

        let auth = self
            .client
            .authorize(&AuthorizationRequest::upload_part(
                session.target(),
                session.content_type(),
                &content_md5,
                session.upload_id(),
                span.part_number,
            ))
            .await?;

        let object_url = self.client.object_url(session.target());
        let url = urls::part_url(&object_url, span.part_number, session.upload_id(), &auth);

        let on_progress: TransferProgressFn = {
            let progress = Arc::clone(&self.progress);
            Arc::new(move |sent| progress.chunk_transfer(span, sent))
        };
        self.client
            .put_chunk(&url, &content_md5, data, Some(on_progress))
            .await?;

        session.record_part(span, content_md5)?;
        let info = self.progress.chunk_completed(session.uploaded_bytes());
        debug!(
            part = span.part_number,
            bytes = span.len(),
            percent = info.percent,
            "chunk uploaded"
        );
        Ok(())
    }

    /// Lists the parts the object store holds; these, not the local
    /// manifest, are what gets merged.
    async fn list_remote_parts(
        &self,
        session: &SessionState,
    ) -> Result<Vec<PartEntry>, UploadError> {
        let target = session.target();
        let upload_id = session.upload_id();
        let object_url = self.client.object_url(target);

        debug!(phase = "list_parts", upload_id = %upload_id, "listing uploaded parts");
        let auth = self
            .client
            .authorize(&AuthorizationRequest::list_parts(target, upload_id))
            .await?;
        let listed = self
            .client
            .list_parts(&urls::list_parts_url(&object_url, upload_id, &auth))
            .await?;

        if listed.len() != session.parts().len() {
            warn!(
                upload_id = %upload_id,
                listed = listed.len(),
                local = session.parts().len(),
                "remote part listing differs from local manifest"
            );
        }
        Ok(listed)
    }

    async fn merge(&self, session: &SessionState, listed: &[PartEntry]) -> Result<(), UploadError> {
        let target = session.target();
        let upload_id = session.upload_id();
        let object_url = self.client.object_url(target);

        debug!(phase = "merge", upload_id = %upload_id, parts = listed.len(), "merging parts");
        let auth = self
            .client
            .authorize(&AuthorizationRequest::merge_parts(target, upload_id))
            .await?;
        self.client
            .merge_parts(
                &urls::merge_url(&object_url, upload_id, &auth),
                build_complete_manifest(listed),
            )
            .await
    }

    async fn confirm(&self, asset: &AssetDescriptor) -> Result<(), UploadError> {
        debug!(phase = "confirm", asset_id = %asset.asset_id, "confirming upload");
        self.client
            .confirm_asset(&ConfirmUploadRequest::created(&asset.asset_id))
            .await
    }
}
