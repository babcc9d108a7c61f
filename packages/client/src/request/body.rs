//! Sum-typed request bodies
//!
//! The engine matches on the variant to serialize bytes and pick the
//! implied `Content-Type`. Serialization happens per attempt so a retried
//! request always replays identical framing (multipart regenerates its
//! boundary, which servers treat as opaque).

use bytes::Bytes;

use crate::error::{self, Error};

use super::multipart;

/// A request body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body; no `Content-Type` is implied.
    #[default]
    None,
    /// UTF-8 text, sent as `text/plain`.
    Text(String),
    /// Raw bytes with an optional caller `Content-Type`; defaults to
    /// `application/octet-stream`.
    Bytes(Bytes, Option<String>),
    /// A JSON value, serialized and sent as `application/json`.
    Json(serde_json::Value),
    /// Pre-rendered XML text, sent as `application/xml`.
    Xml(String),
    /// Key/value pairs form-encoded as
    /// `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Multipart fields and files, sent as `multipart/form-data`.
    Multipart(FormData),
    /// Caller-framed bytes; no `Content-Type` is implied.
    Raw(Bytes),
}

impl Body {
    /// Serialize to wire bytes plus the implied `Content-Type`, if any.
    pub(crate) fn serialize(&self) -> Result<(Bytes, Option<String>), Error> {
        match self {
            Body::None => Ok((Bytes::new(), None)),
            Body::Text(text) => Ok((
                Bytes::copy_from_slice(text.as_bytes()),
                Some("text/plain; charset=utf-8".into()),
            )),
            Body::Bytes(bytes, content_type) => Ok((
                bytes.clone(),
                Some(
                    content_type
                        .clone()
                        .unwrap_or_else(|| "application/octet-stream".into()),
                ),
            )),
            Body::Json(value) => {
                let encoded = serde_json::to_vec(value).map_err(error::builder)?;
                Ok((Bytes::from(encoded), Some("application/json".into())))
            }
            Body::Xml(text) => Ok((
                Bytes::copy_from_slice(text.as_bytes()),
                Some("application/xml".into()),
            )),
            Body::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(pairs).map_err(error::builder)?;
                Ok((
                    Bytes::from(encoded),
                    Some("application/x-www-form-urlencoded".into()),
                ))
            }
            Body::Multipart(form) => {
                let boundary = multipart::random_boundary();
                let encoded = multipart::encode(form, &boundary);
                Ok((
                    encoded,
                    Some(format!("multipart/form-data; boundary={boundary}")),
                ))
            }
            Body::Raw(bytes) => Ok((bytes.clone(), None)),
        }
    }

    /// True for the `None` variant.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }
}

/// Fields and file parts for a `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) files: Vec<FilePart>,
}

/// One uploaded file within a [`FormData`] body.
#[derive(Debug, Clone)]
pub(crate) struct FilePart {
    pub(crate) field: String,
    pub(crate) filename: String,
    pub(crate) content: Bytes,
    pub(crate) content_type: Option<String>,
}

impl FormData {
    /// An empty form.
    #[must_use]
    pub fn new() -> FormData {
        FormData::default()
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> FormData {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append a file part. `content_type` defaults to
    /// `application/octet-stream` on the wire when `None`.
    #[must_use]
    pub fn file(
        mut self,
        field: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> FormData {
        self.files.push(FilePart {
            field: field.into(),
            filename: filename.into(),
            content: content.into(),
            content_type: content_type.map(str::to_owned),
        });
        self
    }

    /// True when no fields or files have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }
}
