//! Error classification predicates
//!
//! Mirrors the retry state machine's view of the world: transport failures
//! and the retryable status set are retryable, everything else is terminal.

use std::error::Error as StdError;
use std::io;

use http::StatusCode;

use super::{Error, Kind, SsrfViolation, TimedOut};

/// Status codes that indicate the server did not process the request and a
/// replay is safe enough to attempt.
pub(crate) const RETRYABLE_STATUS: [StatusCode; 6] = [
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Whether a status belongs to the retryable set.
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUS.contains(&status)
}

impl Error {
    /// True if the input to the builder or an option transformer was rejected.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// True if the client configuration failed validation.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self.inner.kind, Kind::Config)
    }

    /// True if the destination was rejected by the private-range policy.
    #[must_use]
    pub fn is_ssrf(&self) -> bool {
        if matches!(self.inner.kind, Kind::Ssrf) {
            return true;
        }
        // Post-DNS rejections surface from inside the connector chain.
        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<SsrfViolation>() {
                return true;
            }
            source = err.source();
        }
        false
    }

    /// True if the caller's cancellation context fired.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self.inner.kind, Kind::Canceled)
    }

    /// True if a deadline elapsed, either ours or one reported by the stack.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.inner.kind, Kind::Timeout) {
            return true;
        }
        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<TimedOut>() {
                return true;
            }
            if let Some(io_err) = err.downcast_ref::<io::Error>() {
                if io_err.kind() == io::ErrorKind::TimedOut {
                    return true;
                }
            }
            source = err.source();
        }
        false
    }

    /// True for DNS, TCP, TLS and in-flight I/O failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect | Kind::Request)
    }

    /// True if a non-2xx status was surfaced as an error.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    /// True if the redirect policy stopped the chain with an error, or the
    /// hop count exceeded the maximum.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self.inner.kind, Kind::Redirect | Kind::TooManyRedirects)
    }

    /// True if the response body exceeded the configured capture limit.
    #[must_use]
    pub fn is_body_too_large(&self) -> bool {
        matches!(self.inner.kind, Kind::BodyTooLarge)
    }

    /// True if a parsing accessor was called on an empty body.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        matches!(self.inner.kind, Kind::BodyEmpty)
    }

    /// True if response decoding failed.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    /// True if admission was refused under a hard in-flight cap.
    #[must_use]
    pub fn is_concurrency_limit(&self) -> bool {
        matches!(self.inner.kind, Kind::ConcurrencyLimit)
    }

    /// True for download destination conflicts and filesystem failures.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self.inner.kind, Kind::File | Kind::FileExists)
    }

    /// True if a panic was contained during dispatch.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self.inner.kind, Kind::Panic)
    }

    /// Whether the retry state machine would replay a request that failed
    /// with this error. Cancellation, timeouts and policy rejections are
    /// terminal; transport failures and the retryable status set are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        if self.is_ssrf() {
            return false;
        }
        match self.inner.kind {
            Kind::Connect | Kind::Request => true,
            Kind::Status(code) => is_retryable_status(code),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    #[test]
    fn retryable_status_set() {
        for code in [408u16, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(is_retryable_status(status), "{code} should be retryable");
            assert!(error::status_code(status).is_retryable());
        }
        for code in [200u16, 201, 301, 400, 401, 403, 404, 501] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!is_retryable_status(status), "{code} should not retry");
        }
    }

    #[test]
    fn transport_is_retryable_but_ssrf_is_not() {
        assert!(error::connect(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
            .is_retryable());
        let ssrf = error::connect(io::Error::new(
            io::ErrorKind::Other,
            super::SsrfViolation {
                addr: "169.254.169.254".parse().unwrap(),
            },
        ));
        assert!(ssrf.is_ssrf());
        assert!(!ssrf.is_retryable());
    }

    #[test]
    fn timeout_detected_through_chain() {
        let io_err = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert!(error::request(io_err).is_timeout());
        assert!(error::timeout().is_timeout());
        assert!(!error::timeout().is_retryable());
    }
}
