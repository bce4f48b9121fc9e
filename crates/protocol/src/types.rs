use serde::{Deserialize, Serialize};

/// Remote object an asset's bytes are stored under.
///
/// Issued once by asset registration and never changes for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub bucket: String,
    /// Object key inside the bucket. The service calls this field `object`.
    #[serde(rename = "object")]
    pub object_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
}

/// Asset returned by the registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub asset_id: String,
    pub target: UploadTarget,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub video_upload_url: String,
}

/// One accepted part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartEntry {
    /// 1-based part number.
    pub part_number: u32,
    /// Content digest or entity tag reported for the part.
    pub etag: String,
}

/// Progress record delivered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Bytes accounted as uploaded.
    pub loaded: u64,
    /// Total bytes of the source.
    pub total: u64,
    /// Whole percent, 0-100.
    pub percent: u8,
}

impl ProgressInfo {
    /// Progress record with nothing transferred.
    pub fn zero(total: u64) -> Self {
        Self {
            loaded: 0,
            total,
            percent: 0,
        }
    }
}

/// Lifecycle state of the upload controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    #[default]
    Idle,
    Uploading,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl TransferStatus {
    /// Returns `true` while a session is attached (uploading or paused).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Uploading | Self::Paused)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}
