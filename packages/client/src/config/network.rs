//! Proxy selection configuration

use url::Url;

/// How outbound connections are routed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProxyConfig {
    /// Connect directly to the destination.
    #[default]
    Direct,
    /// Route everything through an explicit proxy URL.
    Url(Url),
    /// Consult `HTTP_PROXY`, `HTTPS_PROXY` and `NO_PROXY`.
    System,
}

impl ProxyConfig {
    /// True unless the configuration is direct.
    #[must_use]
    pub fn is_proxied(&self) -> bool {
        !matches!(self, ProxyConfig::Direct)
    }
}
