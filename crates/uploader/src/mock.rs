//! In-process `RemoteProtocolClient` that records every call.

use std::sync::Mutex;

use vodup_protocol::{
    AssetDescriptor, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest, PartEntry,
    SignedAuthorization, UploadTarget,
};

use crate::client::{ClientFuture, RemoteProtocolClient, TransferProgressFn};
use crate::error::UploadError;
use crate::types::UploadPhase;

pub(crate) const INITIATE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://obs.myhwclouds.com/doc/2015-06-30/">
  <Bucket>vod-bucket</Bucket>
  <Key>clip.mp4</Key>
  <UploadId>upload-xyz</UploadId>
</InitiateMultipartUploadResult>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Register(CreateAssetRequest),
    Authorize(AuthorizationRequest),
    Initiate { url: String, content_type: String },
    PutChunk { url: String, content_md5: String, len: usize },
    ListParts(String),
    Merge { url: String, manifest: String },
    Confirm(ConfirmUploadRequest),
}

type PutHook = Box<dyn Fn(u32) + Send + Sync>;
type PhaseHook = (UploadPhase, Box<dyn Fn() + Send + Sync>);

pub(crate) struct MockClient {
    authenticated: bool,
    calls: Mutex<Vec<Call>>,
    initiate_body: Mutex<String>,
    listing: Mutex<Option<Vec<PartEntry>>>,
    accepted: Mutex<Vec<PartEntry>>,
    fail_phase: Mutex<Option<UploadPhase>>,
    fail_part_authorization: Mutex<Option<u32>>,
    put_hook: Mutex<Option<PutHook>>,
    phase_hook: Mutex<Option<PhaseHook>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self {
            authenticated: true,
            calls: Mutex::new(Vec::new()),
            initiate_body: Mutex::new(INITIATE_XML.to_string()),
            listing: Mutex::new(None),
            accepted: Mutex::new(Vec::new()),
            fail_phase: Mutex::new(None),
            fail_part_authorization: Mutex::new(None),
            put_hook: Mutex::new(None),
            phase_hook: Mutex::new(None),
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub(crate) fn set_initiate_body(&self, body: &str) {
        *self.initiate_body.lock().unwrap() = body.to_string();
    }

    /// Overrides the listing, which otherwise echoes every accepted part.
    pub(crate) fn set_listing(&self, parts: Vec<PartEntry>) {
        *self.listing.lock().unwrap() = Some(parts);
    }

    pub(crate) fn fail_at(&self, phase: UploadPhase) {
        *self.fail_phase.lock().unwrap() = Some(phase);
    }

    pub(crate) fn fail_authorization_of_part(&self, part_number: u32) {
        *self.fail_part_authorization.lock().unwrap() = Some(part_number);
    }

    /// Runs `hook` with the part number while each PUT is in flight.
    pub(crate) fn on_put(&self, hook: impl Fn(u32) + Send + Sync + 'static) {
        *self.put_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Runs `hook` while the list or merge call of `phase` is in flight.
    pub(crate) fn on_phase(&self, phase: UploadPhase, hook: impl Fn() + Send + Sync + 'static) {
        *self.phase_hook.lock().unwrap() = Some((phase, Box::new(hook)));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Part numbers of every PUT authorization requested, in order.
    pub(crate) fn authorized_parts(&self) -> Vec<u32> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Authorize(req) => req.part_number,
                _ => None,
            })
            .collect()
    }

    pub(crate) fn put_lengths(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::PutChunk { len, .. } => Some(*len),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn merge_manifest(&self) -> Option<String> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Merge { manifest, .. } => Some(manifest),
            _ => None,
        })
    }

    pub(crate) fn confirmed(&self) -> bool {
        self.calls().iter().any(|c| matches!(c, Call::Confirm(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn run_phase_hook(&self, phase: UploadPhase) {
        if let Some((p, hook)) = self.phase_hook.lock().unwrap().as_ref()
            && *p == phase
        {
            hook();
        }
    }

    fn check(&self, phase: UploadPhase) -> Result<(), UploadError> {
        if *self.fail_phase.lock().unwrap() == Some(phase) {
            return Err(UploadError::TransferRejected {
                phase,
                status: 500,
                body: "mock failure".into(),
            });
        }
        Ok(())
    }
}

fn part_number_of(url: &str) -> u32 {
    url.split("partNumber=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

impl RemoteProtocolClient for MockClient {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn object_url(&self, target: &UploadTarget) -> String {
        format!("https://{}.obs.test/{}", target.bucket, target.object_key)
    }

    fn register_asset(&self, req: &CreateAssetRequest) -> ClientFuture<'_, AssetDescriptor> {
        self.record(Call::Register(req.clone()));
        Box::pin(async move {
            self.check(UploadPhase::Register)?;
            Ok(AssetDescriptor {
                asset_id: "asset-1".into(),
                target: UploadTarget {
                    bucket: "vod-bucket".into(),
                    object_key: "clip.mp4".into(),
                    location: String::new(),
                },
                video_upload_url: String::new(),
            })
        })
    }

    fn authorize(&self, req: &AuthorizationRequest) -> ClientFuture<'_, SignedAuthorization> {
        self.record(Call::Authorize(req.clone()));
        let part = req.part_number;
        Box::pin(async move {
            self.check(UploadPhase::Authorize)?;
            if part.is_some() && part == *self.fail_part_authorization.lock().unwrap() {
                return Err(UploadError::TransferRejected {
                    phase: UploadPhase::Authorize,
                    status: 403,
                    body: "signature denied".into(),
                });
            }
            Ok(SignedAuthorization {
                sign_str: "Signature=sig".into(),
            })
        })
    }

    fn initiate_multipart(&self, url: &str, content_type: &str) -> ClientFuture<'_, String> {
        self.record(Call::Initiate {
            url: url.to_string(),
            content_type: content_type.to_string(),
        });
        Box::pin(async move {
            self.check(UploadPhase::Initiate)?;
            Ok(self.initiate_body.lock().unwrap().clone())
        })
    }

    fn put_chunk(
        &self,
        url: &str,
        content_md5: &str,
        data: Vec<u8>,
        on_progress: Option<TransferProgressFn>,
    ) -> ClientFuture<'_, ()> {
        self.record(Call::PutChunk {
            url: url.to_string(),
            content_md5: content_md5.to_string(),
            len: data.len(),
        });
        let part_number = part_number_of(url);
        let etag = content_md5.to_string();
        Box::pin(async move {
            self.check(UploadPhase::UploadPart)?;
            if let Some(cb) = &on_progress {
                cb(data.len() as u64 / 2);
                cb(data.len() as u64);
            }
            if let Some(hook) = self.put_hook.lock().unwrap().as_ref() {
                hook(part_number);
            }
            self.accepted.lock().unwrap().push(PartEntry { part_number, etag });
            Ok(())
        })
    }

    fn list_parts(&self, url: &str) -> ClientFuture<'_, Vec<PartEntry>> {
        self.record(Call::ListParts(url.to_string()));
        Box::pin(async move {
            self.check(UploadPhase::ListParts)?;
            self.run_phase_hook(UploadPhase::ListParts);
            let listing = self.listing.lock().unwrap().clone();
            Ok(listing.unwrap_or_else(|| self.accepted.lock().unwrap().clone()))
        })
    }

    fn merge_parts(&self, url: &str, manifest: String) -> ClientFuture<'_, ()> {
        self.record(Call::Merge {
            url: url.to_string(),
            manifest,
        });
        Box::pin(async move {
            self.check(UploadPhase::Merge)?;
            self.run_phase_hook(UploadPhase::Merge);
            Ok(())
        })
    }

    fn confirm_asset(&self, req: &ConfirmUploadRequest) -> ClientFuture<'_, ()> {
        self.record(Call::Confirm(req.clone()));
        Box::pin(async move { self.check(UploadPhase::Confirm) })
    }
}
