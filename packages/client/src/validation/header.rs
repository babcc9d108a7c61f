//! Header key and value validation
//!
//! Blocks CRLF injection, RFC 7230 separator abuse and attempts to set
//! headers the engine manages itself.

use super::{fail, has_control, has_crlf, ValidationError};

/// Longest accepted header key.
pub const MAX_HEADER_KEY_LEN: usize = 256;

/// Longest accepted header value.
pub const MAX_HEADER_VALUE_LEN: usize = 8192;

/// Headers owned by the engine. Caller attempts to set these fail: the
/// transport computes framing itself and letting callers override it is a
/// smuggling vector.
pub const MANAGED_HEADERS: [&str; 4] =
    ["content-length", "transfer-encoding", "connection", "upgrade"];

const SEPARATORS: &[u8] = b" \t()<>@,;:\\\"/[]?={}";

/// Validate a header key against RFC 7230 token rules and the managed set.
pub fn validate_header_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return fail("header key", "must not be empty");
    }
    if key.len() > MAX_HEADER_KEY_LEN {
        return fail("header key", format!("longer than {MAX_HEADER_KEY_LEN} bytes"));
    }
    if key.as_bytes()[0] == b':' {
        return fail("header key", "pseudo-headers cannot be set directly");
    }
    for &b in key.as_bytes() {
        if b < 0x20 || b == 0x7F {
            return fail("header key", "contains control characters");
        }
        if SEPARATORS.contains(&b) {
            return fail("header key", format!("contains separator byte {:?}", b as char));
        }
    }
    if is_managed_header(key) {
        return fail("header key", format!("{key:?} is managed by the client"));
    }
    Ok(())
}

/// Validate a header value, with per-header extra rules for `Connection`,
/// `Content-Length` and `Host`.
pub fn validate_header_value(key: &str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_HEADER_VALUE_LEN {
        return fail(
            "header value",
            format!("longer than {MAX_HEADER_VALUE_LEN} bytes"),
        );
    }
    if has_crlf(value) {
        return fail("header value", "contains CR or LF");
    }
    if has_control(value, true) {
        return fail("header value", "contains control characters");
    }
    if key.eq_ignore_ascii_case("connection") {
        let token = value.trim().to_ascii_lowercase();
        if !matches!(token.as_str(), "keep-alive" | "close" | "upgrade") {
            return fail("header value", "Connection accepts keep-alive, close or upgrade");
        }
    }
    if key.eq_ignore_ascii_case("content-length") && value.starts_with('-') {
        return fail("header value", "Content-Length must not be negative");
    }
    Ok(())
}

/// Validate a User-Agent string (a header value with the `User-Agent` rules).
pub fn validate_user_agent(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return fail("user agent", "must not be empty");
    }
    validate_header_value("user-agent", value)
}

/// True if `key` names a header the engine controls.
#[must_use]
pub fn is_managed_header(key: &str) -> bool {
    MANAGED_HEADERS
        .iter()
        .any(|m| key.eq_ignore_ascii_case(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_keys() {
        for key in ["Accept", "X-Request-Id", "If-None-Match", "ETag"] {
            assert!(validate_header_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn rejects_managed_keys_case_insensitively() {
        for key in ["Content-Length", "transfer-encoding", "CONNECTION", "Upgrade"] {
            assert!(validate_header_key(key).is_err(), "{key}");
        }
    }

    #[test]
    fn rejects_pseudo_headers_and_separators() {
        assert!(validate_header_key(":authority").is_err());
        for key in ["a b", "a;b", "a/b", "a(b)", "a=b", "a[b]"] {
            assert!(validate_header_key(key).is_err(), "{key}");
        }
    }

    #[test]
    fn rejects_crlf_injection_in_values() {
        assert!(validate_header_value("x-test", "ok\r\nInjected: yes").is_err());
        assert!(validate_header_value("x-test", "ok\nother").is_err());
    }

    #[test]
    fn value_allows_htab_but_not_other_controls() {
        assert!(validate_header_value("x-test", "a\tb").is_ok());
        assert!(validate_header_value("x-test", "a\x0bb").is_err());
        assert!(validate_header_value("x-test", "a\x7fb").is_err());
    }

    #[test]
    fn connection_value_is_restricted() {
        assert!(validate_header_value("Connection", "keep-alive").is_ok());
        assert!(validate_header_value("Connection", "close").is_ok());
        assert!(validate_header_value("Connection", "TE, trailers").is_err());
    }

    #[test]
    fn negative_content_length_rejected() {
        assert!(validate_header_value("Content-Length", "-1").is_err());
    }
}
