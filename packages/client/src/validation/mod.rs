//! Input validation for URLs, headers, cookies, credentials, query pairs
//! and download paths
//!
//! Pure predicates: no I/O, no mutation of inputs. Invalid input is
//! rejected with a [`ValidationError`] naming the offending field rather
//! than silently sanitized.

pub mod cookie;
pub mod credential;
pub mod header;
pub mod ip;
pub mod path;
pub mod query;
pub mod url;

/// A rejected input, naming the field and the reason for the rejection.
///
/// The reason never echoes full input values, so validation failures are
/// safe to log verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Which input was rejected, e.g. `"url"` or `"header key"`.
    pub field: &'static str,
    /// Human-readable reason for the rejection.
    pub reason: String,
}

pub(crate) fn fail<T>(field: &'static str, reason: impl Into<String>) -> Result<T, ValidationError> {
    Err(ValidationError {
        field,
        reason: reason.into(),
    })
}

/// True if `s` contains a control byte (0x00–0x1F or 0x7F). HTAB can be
/// permitted by callers that accept it (header values).
pub(crate) fn has_control(s: &str, allow_htab: bool) -> bool {
    s.bytes()
        .any(|b| (b < 0x20 && !(allow_htab && b == b'\t')) || b == 0x7F)
}

/// True if `s` contains a carriage return or line feed anywhere.
pub(crate) fn has_crlf(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n')
}
