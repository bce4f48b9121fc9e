//! Boundary to the remote VOD service.
//!
//! `RemoteProtocolClient` is implemented by the HTTP client crate. Keeping
//! it a trait keeps the upload flow independent of transport and testable
//! with mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use vodup_protocol::{
    AssetDescriptor, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest, PartEntry,
    SignedAuthorization, UploadTarget,
};

use crate::error::UploadError;

/// Boxed future returned by every client call.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Observes cumulative bytes of one chunk handed to the transport.
pub type TransferProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Abstract request/response boundary to the VOD service and its object store.
///
/// Signed URLs are assembled by the caller; the client only issues them.
pub trait RemoteProtocolClient: Send + Sync {
    /// Whether an auth token is configured. Checked before any network call.
    fn is_authenticated(&self) -> bool;

    /// Base URL of the object the target points at, without a query.
    fn object_url(&self, target: &UploadTarget) -> String;

    /// Registers a new asset and returns where to upload it.
    fn register_asset(&self, req: &CreateAssetRequest) -> ClientFuture<'_, AssetDescriptor>;

    /// Requests a signed query fragment for one request shape.
    fn authorize(&self, req: &AuthorizationRequest) -> ClientFuture<'_, SignedAuthorization>;

    /// Opens a multipart session. Returns the raw response body.
    fn initiate_multipart(&self, url: &str, content_type: &str) -> ClientFuture<'_, String>;

    /// Uploads one chunk with `content_md5` as its integrity header.
    fn put_chunk(
        &self,
        url: &str,
        content_md5: &str,
        data: Vec<u8>,
        on_progress: Option<TransferProgressFn>,
    ) -> ClientFuture<'_, ()>;

    /// Lists the parts the object store has accepted, in listing order.
    fn list_parts(&self, url: &str) -> ClientFuture<'_, Vec<PartEntry>>;

    /// Merges the parts named in `manifest` into the final object.
    fn merge_parts(&self, url: &str, manifest: String) -> ClientFuture<'_, ()>;

    /// Marks the asset as uploaded.
    fn confirm_asset(&self, req: &ConfirmUploadRequest) -> ClientFuture<'_, ()>;
}
