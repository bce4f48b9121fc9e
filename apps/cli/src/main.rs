//! `vodup` entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Resumable chunked upload of a video file to VOD.
#[derive(Parser, Debug)]
#[command(name = "vodup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Video file to upload
    file: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset title (defaults to the file name)
    #[arg(short, long)]
    title: Option<String>,

    /// Registered video type
    #[arg(long, default_value = "MP4")]
    file_type: String,

    /// MIME type of the file
    #[arg(long, default_value = "video/mp4")]
    content_type: String,

    /// Chunk size in MiB
    #[arg(long)]
    chunk_size_mib: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load(cli.config.as_deref())?;
    config.apply_chunk_size_mib(cli.chunk_size_mib);
    tracing::info!(
        region = %config.client.region,
        chunk_size = config.upload.chunk_size,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(app::run(cli, config));
    // A stdin read may still be parked on a blocking thread.
    rt.shutdown_background();
    result
}
