//! Protocol behavior configuration

/// Wire-level behavior: identification, redirects, HTTP/2 and cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// `User-Agent` sent when the request does not override it.
    pub user_agent: String,
    /// Headers attached to every request. Per-request headers win on
    /// conflict.
    pub default_headers: Vec<(String, String)>,
    /// Follow 3xx responses.
    pub follow_redirects: bool,
    /// Longest redirect chain before failing.
    pub max_redirects: usize,
    /// Offer `h2` via ALPN on TLS connections.
    pub enable_http2: bool,
    /// Maintain a cookie jar across requests on this client.
    pub enable_cookies: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            user_agent: "httpc/1.0".to_string(),
            default_headers: Vec::new(),
            follow_redirects: true,
            max_redirects: 10,
            enable_http2: true,
            enable_cookies: false,
        }
    }
}
