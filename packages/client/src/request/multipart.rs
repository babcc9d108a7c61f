//! `multipart/form-data` encoding

use bytes::{BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;
use ring::rand::{SecureRandom, SystemRandom};

use super::body::FormData;

static RNG: Lazy<SystemRandom> = Lazy::new(SystemRandom::new);

/// A fresh 32-hex-char boundary. Randomness makes collisions with body
/// content astronomically unlikely; no escaping pass is needed.
pub(crate) fn random_boundary() -> String {
    let mut raw = [0u8; 16];
    // SystemRandom only fails if the OS entropy source is unavailable.
    RNG.fill(&mut raw).expect("system rng unavailable");
    let mut boundary = String::with_capacity(32);
    for byte in raw {
        boundary.push_str(&format!("{byte:02x}"));
    }
    boundary
}

/// Render the form into one contiguous multipart payload.
pub(crate) fn encode(form: &FormData, boundary: &str) -> Bytes {
    let mut buf = BytesMut::new();
    for (name, value) in &form.fields {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
        buf.put_slice(escape(name).as_bytes());
        buf.put_slice(b"\"\r\n\r\n");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }
    for part in &form.files {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
        buf.put_slice(escape(&part.field).as_bytes());
        buf.put_slice(b"\"; filename=\"");
        buf.put_slice(escape(&part.filename).as_bytes());
        buf.put_slice(b"\"\r\nContent-Type: ");
        buf.put_slice(
            part.content_type
                .as_deref()
                .unwrap_or("application/octet-stream")
                .as_bytes(),
        );
        buf.put_slice(b"\r\n\r\n");
        buf.put_slice(&part.content);
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"--\r\n");
    buf.freeze()
}

/// Quote-escape a disposition parameter value.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_unique_hex() {
        let a = random_boundary();
        let b = random_boundary();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn encodes_fields_and_files() {
        let form = FormData::new()
            .text("title", "report")
            .file("doc", "report.pdf", &b"%PDF-1.4"[..], Some("application/pdf"));
        let encoded = encode(&form, "BOUNDARY");
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.starts_with("--BOUNDARY\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"title\"\r\n\r\nreport\r\n"));
        assert!(text.contains("name=\"doc\"; filename=\"report.pdf\""));
        assert!(text.contains("Content-Type: application/pdf"));
        assert!(text.ends_with("--BOUNDARY--\r\n"));
    }

    #[test]
    fn escapes_quotes_in_names() {
        let form = FormData::new().text("we\"ird", "v");
        let encoded = encode(&form, "B");
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.contains("name=\"we\\\"ird\""));
    }
}
