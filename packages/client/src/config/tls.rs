//! TLS configuration

/// TLS protocol version bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

/// TLS negotiation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Lowest protocol version offered.
    pub min_version: TlsVersion,
    /// Highest protocol version offered.
    pub max_version: TlsVersion,
    /// Disable certificate verification. Never enable outside tests
    /// against servers you control; the testing preset sets this.
    pub danger_skip_verify: bool,
    /// Extra root certificates (DER) appended to the platform and webpki
    /// roots.
    pub extra_root_certificates: Vec<Vec<u8>>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            max_version: TlsVersion::Tls13,
            danger_skip_verify: false,
            extra_root_certificates: Vec::new(),
        }
    }
}
