//! Signed object-store URL assembly.
//!
//! A signed authorization is a ready-made query fragment (`sign_str`).
//! These helpers place it next to the multipart parameters each request
//! shape needs.

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::messages::SignedAuthorization;
use crate::types::UploadTarget;

/// Placeholder replaced by the bucket name in storage endpoint templates.
pub const BUCKET_PLACEHOLDER: &str = "{bucket}";

/// Characters escaped inside an object-key path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Builds the unsigned URL of `target` on a storage endpoint.
///
/// `endpoint` may contain [`BUCKET_PLACEHOLDER`], e.g.
/// `https://{bucket}.obs.cn-north-4.myhuaweicloud.com`; without it the
/// bucket is used as the first path segment.
pub fn object_url(endpoint: &str, target: &UploadTarget) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let key = target
        .object_key
        .split('/')
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    if endpoint.contains(BUCKET_PLACEHOLDER) {
        format!("{}/{key}", endpoint.replace(BUCKET_PLACEHOLDER, &target.bucket))
    } else {
        format!("{endpoint}/{}/{key}", target.bucket)
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// `POST {object}?uploads&{sign_str}`
pub fn initiate_url(object_url: &str, auth: &SignedAuthorization) -> String {
    format!("{object_url}?uploads&{}", auth.sign_str)
}

/// `PUT {object}?partNumber={n}&uploadId={id}&{sign_str}`
pub fn part_url(
    object_url: &str,
    part_number: u32,
    upload_id: &str,
    auth: &SignedAuthorization,
) -> String {
    format!(
        "{object_url}?partNumber={part_number}&uploadId={}&{}",
        encode(upload_id),
        auth.sign_str
    )
}

/// `GET {object}?{sign_str}&uploadId={id}`
pub fn list_parts_url(object_url: &str, upload_id: &str, auth: &SignedAuthorization) -> String {
    format!("{object_url}?{}&uploadId={}", auth.sign_str, encode(upload_id))
}

/// `POST {object}?{sign_str}&uploadId={id}`
pub fn merge_url(object_url: &str, upload_id: &str, auth: &SignedAuthorization) -> String {
    // Same shape as the listing; the verb differs.
    list_parts_url(object_url, upload_id, auth)
}
