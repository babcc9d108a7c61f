//! rustls client configuration
//!
//! Builds one `ClientConfig` per client from the validated
//! [`TlsConfig`](crate::config::TlsConfig): protocol version bounds,
//! platform + webpki roots, optional extra roots, and ALPN offering `h2`
//! only when HTTP/2 is enabled.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::config::{TlsConfig, TlsVersion};
use crate::error::{self, Error};

pub(crate) fn build_client_config(
    tls: &TlsConfig,
    enable_http2: bool,
) -> Result<ClientConfig, Error> {
    let mut versions: Vec<&'static rustls::SupportedProtocolVersion> = Vec::new();
    if tls.min_version <= TlsVersion::Tls12 && tls.max_version >= TlsVersion::Tls12 {
        versions.push(&rustls::version::TLS12);
    }
    if tls.max_version >= TlsVersion::Tls13 {
        versions.push(&rustls::version::TLS13);
    }
    let builder = ClientConfig::builder_with_protocol_versions(&versions);

    let mut config = if tls.danger_skip_verify {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousAcceptAll::new()))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let native = rustls_native_certs::load_native_certs();
        for cert in native.certs {
            // Unparseable platform certs are skipped, same as other roots
            // consumers.
            let _ = roots.add(cert);
        }
        for der in &tls.extra_root_certificates {
            roots
                .add(CertificateDer::from(der.clone()))
                .map_err(error::builder)?;
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    config.alpn_protocols = if enable_http2 {
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    } else {
        vec![b"http/1.1".to_vec()]
    };
    Ok(config)
}

/// Accepts any certificate. Only reachable through
/// `TlsConfig::danger_skip_verify`, which the testing preset sets.
#[derive(Debug)]
struct DangerousAcceptAll {
    schemes: Vec<SignatureScheme>,
}

impl DangerousAcceptAll {
    fn new() -> DangerousAcceptAll {
        DangerousAcceptAll {
            schemes: rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes(),
        }
    }
}

impl ServerCertVerifier for DangerousAcceptAll {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_follows_http2_flag() {
        let tls = TlsConfig::default();
        let with_h2 = build_client_config(&tls, true).unwrap();
        assert_eq!(with_h2.alpn_protocols, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
        let without = build_client_config(&tls, false).unwrap();
        assert_eq!(without.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn tls13_only_builds() {
        let tls = TlsConfig {
            min_version: TlsVersion::Tls13,
            ..TlsConfig::default()
        };
        assert!(build_client_config(&tls, true).is_ok());
    }
}
