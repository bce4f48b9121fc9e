//! XML envelopes exchanged with the object store.
//!
//! The store answers multipart calls with XML documents. Only a few
//! elements matter to the uploader, so the parsers here scan events
//! instead of binding full document schemas: this tolerates namespaces,
//! extra elements and reordered siblings.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::ProtocolError;
use crate::types::PartEntry;

/// Extracts the multipart session identifier from an initiate response.
///
/// Returns the text of the first `UploadId` element found anywhere in the
/// document, or `None` when it is missing or blank. A JSON body carrying
/// an `UploadId`/`upload_id`/`uploadId` field is accepted as well.
pub fn extract_upload_id(body: &str) -> Result<Option<String>, ProtocolError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with('{') {
        return extract_upload_id_json(trimmed);
    }

    let mut reader = Reader::from_str(trimmed);
    reader.trim_text(true);

    let mut inside = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"UploadId" => inside = true,
            Event::Text(t) if inside => {
                let id = t.unescape()?.trim().to_string();
                return Ok(if id.is_empty() { None } else { Some(id) });
            }
            Event::End(_) if inside => return Ok(None),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn extract_upload_id_json(body: &str) -> Result<Option<String>, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let id = ["UploadId", "upload_id", "uploadId"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(id)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PartField {
    Number,
    ETag,
}

/// Parses a list-parts response into part entries, in document order.
///
/// `Part` elements missing either `PartNumber` or `ETag` are skipped.
pub fn parse_list_parts(body: &str) -> Result<Vec<PartEntry>, ProtocolError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut parts = Vec::new();
    let mut in_part = false;
    let mut field: Option<PartField> = None;
    let mut number: Option<u32> = None;
    let mut etag: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Part" => {
                    in_part = true;
                    number = None;
                    etag = None;
                }
                b"PartNumber" if in_part => field = Some(PartField::Number),
                b"ETag" if in_part => field = Some(PartField::ETag),
                _ => {}
            },
            Event::Text(t) => {
                let Some(f) = field else { continue };
                let text = t.unescape()?.trim().to_string();
                match f {
                    PartField::Number => {
                        let n = text
                            .parse::<u32>()
                            .map_err(|_| ProtocolError::InvalidPartNumber(text.clone()))?;
                        number = Some(n);
                    }
                    PartField::ETag => etag = Some(text),
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Part" if in_part => {
                    if let (Some(part_number), Some(tag)) = (number.take(), etag.take()) {
                        parts.push(PartEntry {
                            part_number,
                            etag: tag,
                        });
                    }
                    in_part = false;
                    field = None;
                }
                b"PartNumber" | b"ETag" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parts)
}

/// Builds the `CompleteMultipartUpload` body for a merge request.
pub fn build_complete_manifest(parts: &[PartEntry]) -> String {
    let mut out = String::from("<CompleteMultipartUpload>");
    for part in parts {
        out.push_str("<Part><PartNumber>");
        out.push_str(&part.part_number.to_string());
        out.push_str("</PartNumber><ETag>");
        out.push_str(&escape(part.etag.as_str()));
        out.push_str("</ETag></Part>");
    }
    out.push_str("</CompleteMultipartUpload>");
    out
}
