//! Client configuration.

use serde::{Deserialize, Serialize};
use vodup_protocol::urls::BUCKET_PLACEHOLDER;

pub const DEFAULT_PROJECT_ID: &str = "0c5375b69b8010de2f1cc016ae1ee655";
pub const DEFAULT_REGION: &str = "cn-north-4";

/// Connection settings for the VOD service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// IAM token sent as `X-Auth-Token`. Empty means unauthenticated.
    #[serde(default)]
    pub token: String,
    /// Overrides `https://vod.{region}.myhuaweicloud.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vod_base_url: Option<String>,
    /// Overrides the object-store endpoint. May contain `{bucket}`;
    /// otherwise requests use path-style addressing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_base_url: Option<String>,
}

fn default_project_id() -> String {
    DEFAULT_PROJECT_ID.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            region: default_region(),
            token: String::new(),
            vod_base_url: None,
            obs_base_url: None,
        }
    }
}

impl ClientConfig {
    /// Config with the default project and region and the given token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Base of every asset-API path: `{base}/v1.0/{project_id}`.
    pub fn vod_endpoint(&self) -> String {
        let base = match &self.vod_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://vod.{}.myhuaweicloud.com", self.region),
        };
        format!("{base}/v1.0/{}", self.project_id)
    }

    /// Object-store endpoint template.
    pub fn obs_endpoint(&self) -> String {
        match &self.obs_base_url {
            Some(url) => url.clone(),
            None => format!("https://{BUCKET_PLACEHOLDER}.obs.{}.myhuaweicloud.com", self.region),
        }
    }
}
