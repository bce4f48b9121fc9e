//! HTTP client for the VOD asset API and its object store.

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use vodup_protocol::{
    AssetDescriptor, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest, PartEntry,
    ProtocolError, SignedAuthorization, UploadTarget, parse_list_parts, urls,
};
use vodup_uploader::{
    ClientFuture, RemoteProtocolClient, TransferProgressFn, UploadError, UploadPhase,
};

use crate::config::ClientConfig;

const AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");
const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Size of the slices a chunk body is streamed in.
const STREAM_SLICE: usize = 256 * 1024;

/// Errors from the VOD client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid auth token")]
    InvalidToken,
}

impl Error {
    /// Maps the error into the upload taxonomy for the failing `phase`.
    pub fn into_upload_error(self, phase: UploadPhase) -> UploadError {
        match self {
            Error::Api { status, body } => UploadError::TransferRejected {
                phase,
                status,
                body,
            },
            Error::Json(e) => UploadError::ProtocolResponseMalformed(e.to_string()),
            Error::Protocol(e) => UploadError::ProtocolResponseMalformed(e.to_string()),
            Error::Http(e) => UploadError::Transport(e.to_string()),
            Error::InvalidToken => UploadError::AuthenticationMissing,
        }
    }
}

/// VOD service client.
pub struct HuaweiVodClient {
    http: reqwest::Client,
    config: ClientConfig,
    vod_endpoint: String,
    obs_endpoint: String,
}

impl HuaweiVodClient {
    /// Creates a client. The token, if any, is sent with every request.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if config.has_token() {
            headers.insert(
                AUTH_TOKEN,
                HeaderValue::from_str(config.token.trim()).map_err(|_| Error::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            vod_endpoint: config.vod_endpoint(),
            obs_endpoint: config.obs_endpoint(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the response if successful, otherwise an `Api` error with its body.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    /// `POST /asset`
    pub async fn create_asset(&self, req: &CreateAssetRequest) -> Result<AssetDescriptor, Error> {
        let url = format!("{}/asset", self.vod_endpoint);
        let resp = self.http.post(&url).json(req).send().await?;
        let body = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /asset/authority`
    pub async fn authority(&self, req: &AuthorizationRequest) -> Result<SignedAuthorization, Error> {
        let url = format!("{}/asset/authority", self.vod_endpoint);
        let resp = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .query(&req.query_pairs())
            .send()
            .await?;
        let body = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST /asset/status/uploaded`
    pub async fn confirm_uploaded(&self, req: &ConfirmUploadRequest) -> Result<(), Error> {
        let url = format!("{}/asset/status/uploaded", self.vod_endpoint);
        let resp = self.http.post(&url).json(req).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Opens a multipart session; returns the raw XML body.
    pub async fn initiate(&self, url: &str, content_type: &str) -> Result<String, Error> {
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .send()
            .await?;
        Ok(Self::check(resp).await?.text().await?)
    }

    /// PUTs one part, streaming the body so `on_progress` sees bytes as the
    /// transport takes them.
    pub async fn upload_part(
        &self,
        url: &str,
        content_md5: &str,
        data: Vec<u8>,
        on_progress: Option<TransferProgressFn>,
    ) -> Result<(), Error> {
        let len = data.len();
        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_MD5, content_md5)
            .header(CONTENT_LENGTH, len)
            .body(progress_body(data, on_progress))
            .send()
            .await?;
        Self::check(resp).await?;
        debug!(bytes = len, "part accepted");
        Ok(())
    }

    /// Lists accepted parts.
    pub async fn list_uploaded_parts(&self, url: &str) -> Result<Vec<PartEntry>, Error> {
        let resp = self.http.get(url).send().await?;
        let body = Self::check(resp).await?.text().await?;
        Ok(parse_list_parts(&body)?)
    }

    /// Merges parts named by the `CompleteMultipartUpload` manifest.
    pub async fn merge(&self, url: &str, manifest: String) -> Result<(), Error> {
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/xml")
            .body(manifest)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// Wraps a chunk so each slice reports cumulative bytes when pulled.
fn progress_body(data: Vec<u8>, on_progress: Option<TransferProgressFn>) -> reqwest::Body {
    let Some(cb) = on_progress else {
        return reqwest::Body::from(data);
    };
    let bytes = Bytes::from(data);
    let total = bytes.len();
    let slices = (0..total).step_by(STREAM_SLICE).map(move |start| {
        let end = (start + STREAM_SLICE).min(total);
        let slice = bytes.slice(start..end);
        cb(end as u64);
        Ok::<_, std::io::Error>(slice)
    });
    reqwest::Body::wrap_stream(futures_util::stream::iter(slices))
}

impl RemoteProtocolClient for HuaweiVodClient {
    fn is_authenticated(&self) -> bool {
        self.config.has_token()
    }

    fn object_url(&self, target: &UploadTarget) -> String {
        urls::object_url(&self.obs_endpoint, target)
    }

    fn register_asset(&self, req: &CreateAssetRequest) -> ClientFuture<'_, AssetDescriptor> {
        let req = req.clone();
        Box::pin(async move {
            self.create_asset(&req)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::Register))
        })
    }

    fn authorize(&self, req: &AuthorizationRequest) -> ClientFuture<'_, SignedAuthorization> {
        let req = req.clone();
        Box::pin(async move {
            self.authority(&req)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::Authorize))
        })
    }

    fn initiate_multipart(&self, url: &str, content_type: &str) -> ClientFuture<'_, String> {
        let url = url.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            self.initiate(&url, &content_type)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::Initiate))
        })
    }

    fn put_chunk(
        &self,
        url: &str,
        content_md5: &str,
        data: Vec<u8>,
        on_progress: Option<TransferProgressFn>,
    ) -> ClientFuture<'_, ()> {
        let url = url.to_string();
        let content_md5 = content_md5.to_string();
        Box::pin(async move {
            self.upload_part(&url, &content_md5, data, on_progress)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::UploadPart))
        })
    }

    fn list_parts(&self, url: &str) -> ClientFuture<'_, Vec<PartEntry>> {
        let url = url.to_string();
        Box::pin(async move {
            self.list_uploaded_parts(&url)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::ListParts))
        })
    }

    fn merge_parts(&self, url: &str, manifest: String) -> ClientFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            self.merge(&url, manifest)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::Merge))
        })
    }

    fn confirm_asset(&self, req: &ConfirmUploadRequest) -> ClientFuture<'_, ()> {
        let req = req.clone();
        Box::pin(async move {
            self.confirm_uploaded(&req)
                .await
                .map_err(|e| e.into_upload_error(UploadPhase::Confirm))
        })
    }
}
