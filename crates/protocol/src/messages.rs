//! Request and response bodies of the asset API.

use serde::{Deserialize, Serialize};

use crate::types::UploadTarget;

/// Body of the asset registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub title: String,
    pub video_name: String,
    pub video_type: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

/// HTTP verb a signed authorization is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Put,
    Post,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

/// Parameters of a signed-authorization request.
///
/// Each constructor matches one request shape the object store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub http_verb: HttpVerb,
    pub content_type: Option<String>,
    pub bucket: String,
    pub object_key: String,
    pub content_md5: Option<String>,
    pub upload_id: Option<String>,
    pub part_number: Option<u32>,
}

impl AuthorizationRequest {
    fn base(verb: HttpVerb, target: &UploadTarget) -> Self {
        Self {
            http_verb: verb,
            content_type: None,
            bucket: target.bucket.clone(),
            object_key: target.object_key.clone(),
            content_md5: None,
            upload_id: None,
            part_number: None,
        }
    }

    /// Authorization to open a multipart session (POST ?uploads).
    pub fn initiate(target: &UploadTarget, content_type: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            ..Self::base(HttpVerb::Post, target)
        }
    }

    /// Authorization to PUT one part with the given digest.
    pub fn upload_part(
        target: &UploadTarget,
        content_type: &str,
        content_md5: &str,
        upload_id: &str,
        part_number: u32,
    ) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            content_md5: Some(content_md5.to_string()),
            upload_id: Some(upload_id.to_string()),
            part_number: Some(part_number),
            ..Self::base(HttpVerb::Put, target)
        }
    }

    /// Authorization to list the parts accepted so far.
    pub fn list_parts(target: &UploadTarget, upload_id: &str) -> Self {
        Self {
            upload_id: Some(upload_id.to_string()),
            ..Self::base(HttpVerb::Get, target)
        }
    }

    /// Authorization to merge the accepted parts.
    pub fn merge_parts(target: &UploadTarget, upload_id: &str) -> Self {
        Self {
            upload_id: Some(upload_id.to_string()),
            ..Self::base(HttpVerb::Post, target)
        }
    }

    /// Query parameters in the order the service documents them.
    ///
    /// Values are raw; the HTTP layer is responsible for encoding.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("http_verb", self.http_verb.as_str().to_string())];
        if let Some(ct) = &self.content_type {
            params.push(("content_type", ct.clone()));
        }
        params.push(("bucket", self.bucket.clone()));
        params.push(("object_key", self.object_key.clone()));
        if let Some(md5) = &self.content_md5 {
            params.push(("content_md5", md5.clone()));
        }
        if let Some(id) = &self.upload_id {
            params.push(("upload_id", id.clone()));
        }
        if let Some(n) = self.part_number {
            params.push(("part_number", n.to_string()));
        }
        params
    }
}

/// Signed authorization issued by the asset API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAuthorization {
    /// Pre-encoded query fragment to append to the storage URL.
    pub sign_str: String,
}

/// Asset state reported back to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetStatus {
    Created,
}

/// Body of the upload confirmation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmUploadRequest {
    pub asset_id: String,
    pub status: AssetStatus,
}

impl ConfirmUploadRequest {
    pub fn created(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            status: AssetStatus::Created,
        }
    }
}
