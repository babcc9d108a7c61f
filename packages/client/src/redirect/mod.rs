//! Redirect policy
//!
//! The engine consults a [`Policy`] before following each 3xx hop. The
//! hook signature carries the next location and the chain so far, so
//! per-request overrides and custom rules compose with the client
//! default.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION, WWW_AUTHENTICATE};
use http::StatusCode;
use url::Url;

use crate::error::BoxError;

/// Information about the pending redirect hop.
#[derive(Debug)]
pub struct Attempt<'a> {
    pub(crate) status: StatusCode,
    pub(crate) next: &'a Url,
    pub(crate) previous: &'a [Url],
}

impl<'a> Attempt<'a> {
    /// The redirect status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The URL the response points at.
    #[must_use]
    pub fn url(&self) -> &Url {
        self.next
    }

    /// URLs already visited in this chain, oldest first.
    #[must_use]
    pub fn previous(&self) -> &[Url] {
        self.previous
    }

    /// Follow the hop.
    #[must_use]
    pub fn follow(self) -> Action {
        Action {
            inner: ActionKind::Follow,
        }
    }

    /// Stop and return the 3xx response to the caller.
    #[must_use]
    pub fn stop(self) -> Action {
        Action {
            inner: ActionKind::Stop,
        }
    }

    /// Fail the request with `error`.
    pub fn error<E: Into<BoxError>>(self, error: E) -> Action {
        Action {
            inner: ActionKind::Error(error.into()),
        }
    }
}

/// What to do with a redirect hop.
#[derive(Debug)]
pub struct Action {
    pub(crate) inner: ActionKind,
}

#[derive(Debug)]
pub(crate) enum ActionKind {
    Follow,
    Stop,
    Error(BoxError),
}

/// Decides whether redirect hops are followed.
#[derive(Clone)]
pub struct Policy {
    inner: PolicyKind,
}

#[derive(Clone)]
enum PolicyKind {
    Limit(usize),
    None,
    Custom(Arc<dyn Fn(Attempt<'_>) -> Action + Send + Sync>),
}

impl Policy {
    /// Follow up to `max` hops, then fail with a too-many-redirects error.
    #[must_use]
    pub fn limited(max: usize) -> Policy {
        Policy {
            inner: PolicyKind::Limit(max),
        }
    }

    /// Never follow; 3xx responses are returned to the caller unchanged.
    #[must_use]
    pub fn none() -> Policy {
        Policy {
            inner: PolicyKind::None,
        }
    }

    /// Decide each hop with a custom function.
    pub fn custom<F>(policy: F) -> Policy
    where
        F: Fn(Attempt<'_>) -> Action + Send + Sync + 'static,
    {
        Policy {
            inner: PolicyKind::Custom(Arc::new(policy)),
        }
    }

    pub(crate) fn check(
        &self,
        status: StatusCode,
        next: &Url,
        previous: &[Url],
    ) -> ActionKind {
        let attempt = Attempt {
            status,
            next,
            previous,
        };
        match &self.inner {
            PolicyKind::Limit(max) => {
                if previous.len() >= *max {
                    ActionKind::Error(Box::new(TooManyRedirects))
                } else {
                    ActionKind::Follow
                }
            }
            PolicyKind::None => ActionKind::Stop,
            PolicyKind::Custom(custom) => custom(attempt).inner,
        }
    }
}

impl Default for Policy {
    fn default() -> Policy {
        Policy::limited(10)
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            PolicyKind::Limit(max) => f.debug_tuple("Policy::Limit").field(max).finish(),
            PolicyKind::None => f.write_str("Policy::None"),
            PolicyKind::Custom(_) => f.write_str("Policy::Custom"),
        }
    }
}

/// Marker the engine maps to its too-many-redirects error kind.
#[derive(Debug)]
pub(crate) struct TooManyRedirects;

impl fmt::Display for TooManyRedirects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("redirect limit exceeded")
    }
}

impl std::error::Error for TooManyRedirects {}

/// Strip credentials and cookies when a redirect leaves the original
/// host. Same-host hops keep their headers.
pub(crate) fn remove_sensitive_headers(headers: &mut HeaderMap, next: &Url, previous: &[Url]) {
    if let Some(original) = previous.first() {
        let cross_host = next.host_str() != original.host_str()
            || next.port_or_known_default() != original.port_or_known_default();
        if cross_host {
            headers.remove(AUTHORIZATION);
            headers.remove(COOKIE);
            headers.remove(PROXY_AUTHORIZATION);
            headers.remove(WWW_AUTHENTICATE);
        }
    }
}
