//! Security policy configuration

/// Response and destination hardening knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Largest response body the engine will capture, in bytes.
    pub max_response_body_size: u64,
    /// Permit requests to loopback, RFC 1918, link-local and ULA ranges.
    /// Disable for services that fetch caller-supplied URLs.
    pub allow_private_ips: bool,
    /// Reject responses whose transferred byte count does not match the
    /// advertised `Content-Length`.
    pub strict_content_length: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_response_body_size: 10 * 1024 * 1024,
            allow_private_ips: true,
            strict_content_length: true,
        }
    }
}
