//! Minimal `multipart/form-data` decoder.
//!
//! The whole body is buffered (bounded by the declared `Content-Length`) and
//! split on the boundary delimiter in a single pass. Parameter values are not
//! unescaped, nested multipart is not supported and a missing terminator is
//! tolerated: whatever was read is decoded.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use thiserror::Error;

/// A single decoded form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadedField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content: Bytes,
    },
}

impl UploadedField {
    pub fn name(&self) -> &str {
        match self {
            UploadedField::Text { name, .. } | UploadedField::File { name, .. } => name,
        }
    }

    /// Client-supplied file name, `None` for plain fields.
    pub fn filename(&self) -> Option<&str> {
        match self {
            UploadedField::File { filename, .. } => Some(filename),
            UploadedField::Text { .. } => None,
        }
    }
}

/// Decoded fields keyed by field name.
pub type FormData = HashMap<String, UploadedField>;

#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("Part headers are not valid UTF-8")]
    HeaderEncoding,

    #[error("Malformed part header: {0:?}")]
    MalformedHeader(String),

    #[error("Field '{0}' is not valid UTF-8 text")]
    FieldEncoding(String),

    #[error("Failed to read request body: {0}")]
    Body(String),
}

/// Extracts the `boundary` parameter of a `Content-Type` value.
pub fn boundary(content_type: &str) -> Option<String> {
    parse_params(content_type)
        .remove("boundary")
        .filter(|b| !b.is_empty())
}

/// Upper bound on the buffer reserved up front from the declared length.
const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Reads at most `content_length` bytes from a body stream.
///
/// A stream that ends early yields what was received; bytes past the declared
/// length are ignored.
pub async fn read_declared<S, E>(stream: S, content_length: usize) -> Result<Bytes, MultipartError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut buffer = Vec::with_capacity(content_length.min(INITIAL_BUFFER_CAPACITY));

    while buffer.len() < content_length {
        let Some(chunk) = stream.next().await else {
            tracing::warn!(
                "Body ended after {} of {} declared bytes",
                buffer.len(),
                content_length
            );
            break;
        };
        let chunk = chunk.map_err(|e| MultipartError::Body(e.to_string()))?;
        let take = (content_length - buffer.len()).min(chunk.len());
        buffer.extend_from_slice(&chunk[..take]);
    }

    Ok(Bytes::from(buffer))
}

/// Decodes a buffered multipart body.
///
/// Returns an empty mapping when the content type carries no boundary. Parts
/// without a header/body separator or without a `name` are skipped.
pub fn decode(content_type: &str, body: &Bytes) -> Result<FormData, MultipartError> {
    let mut form = FormData::new();
    let Some(boundary) = boundary(content_type) else {
        return Ok(form);
    };
    let delimiter = format!("--{}", boundary).into_bytes();

    for part in split(body, &delimiter) {
        if part.is_empty() || part == b"--" || part == b"--\r\n" {
            continue;
        }
        let part = part.strip_prefix(b"\r\n").unwrap_or(part);
        let part = part.strip_suffix(b"\r\n").unwrap_or(part);
        if part == b"--" {
            break;
        }

        let Some((head, content)) = split_once(part, b"\r\n\r\n") else {
            continue;
        };

        let headers = parse_headers(head)?;
        let Some(disposition) = headers.get("content-disposition") else {
            continue;
        };
        let mut params = parse_params(disposition);
        let Some(name) = params.remove("name") else {
            continue;
        };

        let field = match params.remove("filename").filter(|f| !f.is_empty()) {
            Some(filename) => UploadedField::File {
                name: name.clone(),
                filename,
                content: body.slice_ref(content),
            },
            None => {
                let value = std::str::from_utf8(content)
                    .map_err(|_| MultipartError::FieldEncoding(name.clone()))?
                    .to_string();
                UploadedField::Text {
                    name: name.clone(),
                    value,
                }
            }
        };
        form.insert(name, field);
    }

    Ok(form)
}

fn parse_headers(head: &[u8]) -> Result<HashMap<String, String>, MultipartError> {
    let head = std::str::from_utf8(head).map_err(|_| MultipartError::HeaderEncoding)?;
    let mut headers = HashMap::new();

    for line in head.split("\r\n").filter(|l| !l.is_empty()) {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| MultipartError::MalformedHeader(line.to_string()))?;
        headers.insert(key.trim().to_lowercase(), value.trim().to_string());
    }

    Ok(headers)
}

/// `key=value` parameters after the first `;`, with quotes stripped.
fn parse_params(header_value: &str) -> HashMap<String, String> {
    header_value
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_lowercase(),
                value.trim().trim_matches('"').to_string(),
            )
        })
        .collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(pos) = find(rest, needle) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    parts.push(rest);
    parts
}

fn split_once<'a>(haystack: &'a [u8], needle: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    find(haystack, needle).map(|pos| (&haystack[..pos], &haystack[pos + needle.len()..]))
}
