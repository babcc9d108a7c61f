//! Cookie field validation

use super::{fail, has_control, has_crlf, ValidationError};

/// Longest accepted cookie name or value.
pub const MAX_COOKIE_LEN: usize = 4096;

/// Validate a cookie name: 1–4096 bytes, no control bytes, none of `;`,
/// `,` or `=` (the RFC 6265 delimiters).
pub fn validate_cookie_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return fail("cookie name", "must not be empty");
    }
    if name.len() > MAX_COOKIE_LEN {
        return fail("cookie name", format!("longer than {MAX_COOKIE_LEN} bytes"));
    }
    if has_control(name, false) {
        return fail("cookie name", "contains control characters");
    }
    if name.bytes().any(|b| matches!(b, b';' | b',' | b'=')) {
        return fail("cookie name", "contains a delimiter (';', ',' or '=')");
    }
    Ok(())
}

/// Validate a cookie value: up to 4096 bytes, no control bytes or CR/LF.
pub fn validate_cookie_value(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_COOKIE_LEN {
        return fail("cookie value", format!("longer than {MAX_COOKIE_LEN} bytes"));
    }
    if has_crlf(value) {
        return fail("cookie value", "contains CR or LF");
    }
    if has_control(value, false) {
        return fail("cookie value", "contains control characters");
    }
    Ok(())
}

/// Validate a cookie domain attribute.
pub fn validate_cookie_domain(domain: &str) -> Result<(), ValidationError> {
    if domain.len() > MAX_COOKIE_LEN {
        return fail("cookie domain", format!("longer than {MAX_COOKIE_LEN} bytes"));
    }
    if has_control(domain, false) {
        return fail("cookie domain", "contains control characters");
    }
    if domain.bytes().any(|b| matches!(b, b';' | b',')) {
        return fail("cookie domain", "contains a delimiter");
    }
    Ok(())
}

/// Validate a cookie path attribute.
pub fn validate_cookie_path(path: &str) -> Result<(), ValidationError> {
    if path.len() > MAX_COOKIE_LEN {
        return fail("cookie path", format!("longer than {MAX_COOKIE_LEN} bytes"));
    }
    if has_control(path, false) {
        return fail("cookie path", "contains control characters");
    }
    if path.bytes().any(|b| b == b';') {
        return fail("cookie path", "contains ';'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(validate_cookie_name("session_id").is_ok());
        assert!(validate_cookie_name("").is_err());
        assert!(validate_cookie_name("a=b").is_err());
        assert!(validate_cookie_name("a;b").is_err());
        assert!(validate_cookie_name("a,b").is_err());
        assert!(validate_cookie_name("a\nb").is_err());
    }

    #[test]
    fn value_rules() {
        assert!(validate_cookie_value("").is_ok());
        assert!(validate_cookie_value("abc123==").is_ok());
        assert!(validate_cookie_value("a\r\nb").is_err());
        assert!(validate_cookie_value(&"v".repeat(MAX_COOKIE_LEN + 1)).is_err());
    }

    #[test]
    fn domain_and_path_rules() {
        assert!(validate_cookie_domain("example.com").is_ok());
        assert!(validate_cookie_domain("evil;com").is_err());
        assert!(validate_cookie_path("/app").is_ok());
        assert!(validate_cookie_path("/app;x").is_err());
    }
}
