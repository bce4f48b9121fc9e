//! Runs one upload with stdin and Ctrl-C controls.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vodup_client::HuaweiVodClient;
use vodup_uploader::{
    ProgressCallback, ProgressInfo, RemoteProtocolClient, UploadOptions, VodUploader,
};

use crate::Cli;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
    Status,
}

/// Parses one control line. Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Command::Pause),
        "r" | "resume" => Some(Command::Resume),
        "s" | "stop" | "q" | "quit" => Some(Command::Stop),
        "?" | "status" => Some(Command::Status),
        _ => None,
    }
}

fn progress_logger() -> ProgressCallback {
    Arc::new(|p: ProgressInfo| {
        info!(percent = p.percent, loaded = p.loaded, total = p.total, "progress");
    })
}

/// Uploads the file named on the command line until it completes, fails or
/// is stopped.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if !config.client.has_token() {
        warn!("no auth token configured; set [client].token or VODUP_TOKEN");
    }

    let client = HuaweiVodClient::new(config.client)?;
    let uploader = Arc::new(VodUploader::new(client, config.upload));
    let cancel = CancellationToken::new();

    let controls = tokio::spawn(control_loop(
        BufReader::new(tokio::io::stdin()),
        Arc::clone(&uploader),
        cancel.clone(),
    ));

    let interrupt = {
        let uploader = Arc::clone(&uploader);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if res.is_ok() {
                        info!("interrupt received, stopping upload");
                        uploader.stop_upload();
                    }
                }
                _ = cancel.cancelled() => {}
            }
        })
    };

    info!("controls: p = pause, r = resume, s = stop, ? = status");
    let options = UploadOptions {
        title: cli.title,
        file_type: cli.file_type,
        content_type: cli.content_type,
        on_progress: Some(progress_logger()),
    };
    let result = uploader.upload_file(&cli.file, options).await;

    cancel.cancel();
    let _ = interrupt.await;
    controls.abort();

    match result? {
        Some(asset) => {
            info!(asset_id = %asset.asset_id, "upload complete");
            Ok(())
        }
        None => anyhow::bail!("upload stopped before completion"),
    }
}

/// Applies control lines from `reader` until EOF or cancellation.
pub async fn control_loop<R, C>(
    reader: R,
    uploader: Arc<VodUploader<C>>,
    cancel: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
    C: RemoteProtocolClient,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        apply(&uploader, &line);
    }
}

fn apply<C: RemoteProtocolClient>(uploader: &VodUploader<C>, line: &str) {
    match parse_command(line) {
        Some(Command::Pause) => {
            if !uploader.pause_upload() {
                warn!(status = %uploader.get_upload_status(), "nothing to pause");
            }
        }
        Some(Command::Resume) => {
            if !uploader.resume_upload(Some(progress_logger())) {
                warn!(status = %uploader.get_upload_status(), "nothing to resume");
            }
        }
        Some(Command::Stop) => {
            uploader.stop_upload();
        }
        Some(Command::Status) => {
            info!(status = %uploader.get_upload_status(), "status");
        }
        None => warn!(input = line.trim(), "unknown command"),
    }
}
