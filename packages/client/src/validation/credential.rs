//! Credential validation for Basic auth and bearer tokens

use super::{fail, has_control, ValidationError};

/// Longest accepted username or password.
pub const MAX_CREDENTIAL_LEN: usize = 1024;

/// Longest accepted bearer token.
pub const MAX_TOKEN_LEN: usize = 4096;

/// Validate a Basic auth username: non-empty, bounded, no control bytes,
/// no `:` (it delimits the userinfo pair).
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return fail("username", "must not be empty");
    }
    if username.len() > MAX_CREDENTIAL_LEN {
        return fail("username", format!("longer than {MAX_CREDENTIAL_LEN} bytes"));
    }
    if has_control(username, false) {
        return fail("username", "contains control characters");
    }
    if username.contains(':') {
        return fail("username", "must not contain ':'");
    }
    Ok(())
}

/// Validate a Basic auth password. Empty passwords are allowed.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_CREDENTIAL_LEN {
        return fail("password", format!("longer than {MAX_CREDENTIAL_LEN} bytes"));
    }
    if has_control(password, false) {
        return fail("password", "contains control characters");
    }
    Ok(())
}

/// Validate a bearer token: non-empty, bounded, no control bytes.
pub fn validate_bearer_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return fail("bearer token", "must not be empty");
    }
    if token.len() > MAX_TOKEN_LEN {
        return fail("bearer token", format!("longer than {MAX_TOKEN_LEN} bytes"));
    }
    if has_control(token, false) {
        return fail("bearer token", "contains control characters");
    }
    Ok(())
}
