//! Options and configuration for the upload flow.

use std::fmt;

use serde::{Deserialize, Serialize};
use vodup_transfer::{DEFAULT_CHUNK_SIZE, ProgressCallback};

/// Remote phase of an upload attempt, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPhase {
    Register,
    Authorize,
    Initiate,
    UploadPart,
    ListParts,
    Merge,
    Confirm,
}

impl UploadPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Authorize => "authorize",
            Self::Initiate => "initiate",
            Self::UploadPart => "upload_part",
            Self::ListParts => "list_parts",
            Self::Merge => "merge",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-upload options.
#[derive(Clone)]
pub struct UploadOptions {
    /// Asset title; defaults to the source name.
    pub title: Option<String>,
    /// Registered video type, e.g. `MP4`.
    pub file_type: String,
    /// MIME type used for initiation and part authorizations.
    pub content_type: String,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            title: None,
            file_type: "MP4".into(),
            content_type: "video/mp4".into(),
            on_progress: None,
        }
    }
}

impl UploadOptions {
    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.on_progress = Some(cb);
        self
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("title", &self.title)
            .field("file_type", &self.file_type)
            .field("content_type", &self.content_type)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Controller-wide settings shared by every upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Category id; empty uses the service default.
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            category_id: String::new(),
            description: String::new(),
        }
    }
}
