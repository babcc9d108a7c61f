//! Query parameter validation
//!
//! Values are form-encoded by the URL serializer before hitting the wire,
//! so validation here only blocks what encoding cannot repair: control
//! bytes and structurally ambiguous keys.

use super::{fail, has_control, has_crlf, ValidationError};

/// Longest accepted query key.
pub const MAX_QUERY_KEY_LEN: usize = 1024;

/// Longest accepted query value.
pub const MAX_QUERY_VALUE_LEN: usize = 8192;

/// Validate a query key: non-empty, bounded, no `&`, no control bytes.
pub fn validate_query_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return fail("query key", "must not be empty");
    }
    if key.len() > MAX_QUERY_KEY_LEN {
        return fail("query key", format!("longer than {MAX_QUERY_KEY_LEN} bytes"));
    }
    if key.contains('&') {
        return fail("query key", "must not contain '&'");
    }
    if has_crlf(key) || has_control(key, false) {
        return fail("query key", "contains control characters");
    }
    Ok(())
}

/// Validate a query value: bounded, no control bytes.
pub fn validate_query_value(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_QUERY_VALUE_LEN {
        return fail(
            "query value",
            format!("longer than {MAX_QUERY_VALUE_LEN} bytes"),
        );
    }
    if has_crlf(value) || has_control(value, false) {
        return fail("query value", "contains control characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rules() {
        assert!(validate_query_key("page").is_ok());
        assert!(validate_query_key("").is_err());
        assert!(validate_query_key("a&b").is_err());
        assert!(validate_query_key("a\rb").is_err());
    }

    #[test]
    fn value_rules() {
        assert!(validate_query_value("").is_ok());
        assert!(validate_query_value("two words & symbols = fine").is_ok());
        assert!(validate_query_value("a\nb").is_err());
    }
}
