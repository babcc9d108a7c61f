//! Transparent gzip/deflate response decoding
//!
//! Only `gzip` and `deflate` are decoded; any other `Content-Encoding`
//! is passed through untouched with its header preserved. Decoded output
//! is bounded by the same cap as wire capture, so a small compressed
//! body cannot expand past the configured limit.

use std::io::Read;

use bytes::Bytes;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use http::header::CONTENT_ENCODING;
use http::HeaderMap;

use crate::error::{self, Error};

/// Decoding strategy derived from `Content-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentDecoder {
    /// No decoding required or encoding unknown.
    Identity,
    Gzip,
    Deflate,
}

/// Choose a decoder from the response headers.
pub(crate) fn decoder_for(headers: &HeaderMap) -> ContentDecoder {
    let Some(value) = headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()) else {
        return ContentDecoder::Identity;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => ContentDecoder::Gzip,
        "deflate" => ContentDecoder::Deflate,
        _ => ContentDecoder::Identity,
    }
}

/// Decode `body`, enforcing `limit` on the decompressed size.
pub(crate) fn decode(
    decoder: ContentDecoder,
    body: Bytes,
    limit: u64,
) -> Result<Bytes, Error> {
    match decoder {
        ContentDecoder::Identity => Ok(body),
        ContentDecoder::Gzip => {
            read_limited(MultiGzDecoder::new(&body[..]), limit, body.len())
        }
        ContentDecoder::Deflate => {
            // Servers disagree about RFC 9110 "deflate": most send zlib
            // framing, some send a bare deflate stream. Try zlib first.
            match read_limited(ZlibDecoder::new(&body[..]), limit, body.len()) {
                Ok(decoded) => Ok(decoded),
                Err(err) if err.is_body_too_large() => Err(err),
                Err(_) => read_limited(DeflateDecoder::new(&body[..]), limit, body.len()),
            }
        }
    }
}

fn read_limited<R: Read>(reader: R, limit: u64, size_hint: usize) -> Result<Bytes, Error> {
    let mut decoded = Vec::with_capacity(size_hint.min(limit as usize));
    let mut bounded = reader.take(limit + 1);
    bounded
        .read_to_end(&mut decoded)
        .map_err(error::decode)?;
    if decoded.len() as u64 > limit {
        return Err(error::body_too_large(limit));
    }
    Ok(Bytes::from(decoded))
}
