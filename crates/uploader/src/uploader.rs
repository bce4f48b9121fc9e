//! Upload controller: the public surface of the crate.
//!
//! One `VodUploader` runs at most one upload at a time. `upload()` drives the
//! whole attempt; `pause_upload`, `resume_upload` and `stop_upload` are
//! control signals that may be called from any task while it runs.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vodup_protocol::{AssetDescriptor, TransferStatus};
use vodup_transfer::{
    ChunkDigestEngine, ChunkSource, FileSource, Md5Base64, ProgressCallback, ProgressReporter,
    TransferStateMachine,
};

use crate::client::RemoteProtocolClient;
use crate::error::UploadError;
use crate::orchestrator::UploadOrchestrator;
use crate::types::{UploadOptions, UploaderConfig};

/// Resumable chunked uploader bound to one remote client.
pub struct VodUploader<C> {
    client: Arc<C>,
    config: UploaderConfig,
    state: TransferStateMachine,
    progress: Arc<ProgressReporter>,
    digest: Box<dyn ChunkDigestEngine>,
}

impl<C: RemoteProtocolClient> VodUploader<C> {
    pub fn new(client: C, config: UploaderConfig) -> Self {
        Self::with_client(Arc::new(client), config)
    }

    /// Creates an uploader sharing an existing client.
    pub fn with_client(client: Arc<C>, config: UploaderConfig) -> Self {
        Self {
            client,
            config,
            state: TransferStateMachine::new(),
            progress: Arc::new(ProgressReporter::new()),
            digest: Box::new(Md5Base64),
        }
    }

    /// Replaces the per-chunk digest (MD5/base64 by default).
    pub fn with_digest_engine(mut self, engine: impl ChunkDigestEngine + 'static) -> Self {
        self.digest = Box::new(engine);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Uploads `source` as a new asset.
    ///
    /// Resolves to the registered asset once merged and confirmed, or to
    /// `None` if the upload was stopped. A pause keeps this future pending
    /// until the upload is resumed or stopped.
    pub async fn upload(
        &self,
        source: Arc<dyn ChunkSource>,
        options: UploadOptions,
    ) -> Result<Option<AssetDescriptor>, UploadError> {
        if let Err(e) = self.state.start(self.client.is_authenticated()) {
            let e = UploadError::from(e);
            warn!(error = %e, "upload rejected");
            return Err(e);
        }
        let _guard = AttemptGuard {
            state: &self.state,
            progress: &self.progress,
        };

        self.progress
            .begin(source.len(), 0, options.on_progress.clone());
        info!(source = %source.name(), bytes = source.len(), "upload started");

        let orchestrator = UploadOrchestrator::new(
            &*self.client,
            &self.state,
            Arc::clone(&self.progress),
            &*self.digest,
            &self.config,
        );

        match orchestrator.run(source, &options).await {
            Ok(Some(asset)) => {
                self.progress.set_callback(None);
                if self.state.complete() {
                    info!(asset_id = %asset.asset_id, "upload completed");
                    Ok(Some(asset))
                } else {
                    info!(asset_id = %asset.asset_id, "upload stopped during finalize");
                    Ok(None)
                }
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.progress.set_callback(None);
                if self.state.fail() {
                    error!(error = %e, "upload failed");
                    Err(e)
                } else {
                    debug!(error = %e, "upload stopped before failure surfaced");
                    Ok(None)
                }
            }
        }
    }

    /// Opens `path` and uploads it.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<Option<AssetDescriptor>, UploadError> {
        let source = FileSource::open(path).await?;
        self.upload(Arc::new(source), options).await
    }

    /// Requests a pause at the next chunk checkpoint.
    ///
    /// Returns `false` unless an upload is in progress.
    pub fn pause_upload(&self) -> bool {
        if !self.state.pause() {
            warn!(status = %self.state.status(), "pause rejected");
            return false;
        }
        info!("pause requested");
        true
    }

    /// Resumes a paused upload from its next part.
    ///
    /// `on_progress` replaces the progress callback for the rest of the
    /// attempt. Returns `false` unless the upload is paused.
    pub fn resume_upload(&self, on_progress: Option<ProgressCallback>) -> bool {
        let status = self.state.status();
        if status != TransferStatus::Paused {
            warn!(status = %status, "resume rejected");
            return false;
        }
        if let Some(cb) = on_progress {
            self.progress.set_callback(Some(cb));
        }
        if !self.state.resume() {
            warn!(status = %self.state.status(), "resume rejected");
            return false;
        }
        info!("resume requested");
        true
    }

    /// Abandons the current upload at the next chunk checkpoint.
    ///
    /// Delivers one zero-progress callback. Returns `false` when no upload is
    /// uploading or paused.
    pub fn stop_upload(&self) -> bool {
        if !self.state.stop() {
            warn!(status = %self.state.status(), "stop rejected");
            return false;
        }
        self.progress.reset_and_release();
        info!("upload stopped");
        true
    }

    pub fn get_upload_status(&self) -> TransferStatus {
        self.state.status()
    }

    /// Receiver observing every status transition.
    pub fn subscribe_status(&self) -> watch::Receiver<TransferStatus> {
        self.state.subscribe()
    }
}

/// Stops the session if the `upload()` future is dropped mid-attempt.
struct AttemptGuard<'a> {
    state: &'a TransferStateMachine,
    progress: &'a ProgressReporter,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.state.stop() {
            self.progress.reset_and_release();
            debug!("upload future dropped; session stopped");
        }
    }
}
