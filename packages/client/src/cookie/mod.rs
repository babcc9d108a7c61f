//! HTTP cookies
//!
//! [`Cookie`] wraps a parsed RFC 6265 cookie for request attachment and
//! response inspection. [`Jar`] is the per-client store used when cookies
//! are enabled in config: `Set-Cookie` headers are merged in after each
//! response and matching cookies are replayed on later requests.

use std::fmt;
use std::sync::RwLock;

use http::header::{HeaderMap, SET_COOKIE};
use url::Url;

use crate::validation::cookie::{
    validate_cookie_domain, validate_cookie_name, validate_cookie_path, validate_cookie_value,
};
use crate::validation::ValidationError;

/// A single HTTP cookie.
#[derive(Clone)]
pub struct Cookie(cookie::Cookie<'static>);

impl Cookie {
    /// Build a cookie from a validated name and value.
    pub fn new(name: &str, value: &str) -> Result<Cookie, ValidationError> {
        validate_cookie_name(name)?;
        validate_cookie_value(value)?;
        Ok(Cookie(
            cookie::Cookie::new(name.to_owned(), value.to_owned()),
        ))
    }

    /// Parse a full cookie string, attributes included, e.g.
    /// `id=a3fWa; Path=/; Secure; HttpOnly`.
    pub fn parse(input: &str) -> Result<Cookie, ValidationError> {
        let parsed = cookie::Cookie::parse(input.to_owned())
            .map_err(|e| ValidationError {
                field: "cookie",
                reason: e.to_string(),
            })?;
        validate_cookie_name(parsed.name())?;
        validate_cookie_value(parsed.value())?;
        if let Some(domain) = parsed.domain() {
            validate_cookie_domain(domain)?;
        }
        if let Some(path) = parsed.path() {
            validate_cookie_path(path)?;
        }
        Ok(Cookie(parsed))
    }

    pub(crate) fn from_raw(raw: cookie::Cookie<'static>) -> Cookie {
        Cookie(raw)
    }

    /// The cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// The cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// The domain attribute, if set.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.0.domain()
    }

    /// The path attribute, if set.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.0.path()
    }

    /// True if the `Secure` directive is set.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.0.secure().unwrap_or(false)
    }

    /// True if the `HttpOnly` directive is set.
    #[must_use]
    pub fn http_only(&self) -> bool {
        self.0.http_only().unwrap_or(false)
    }

    /// Restrict the cookie to a domain.
    pub fn with_domain(mut self, domain: &str) -> Result<Cookie, ValidationError> {
        validate_cookie_domain(domain)?;
        self.0.set_domain(domain.to_owned());
        Ok(self)
    }

    /// Restrict the cookie to a path.
    pub fn with_path(mut self, path: &str) -> Result<Cookie, ValidationError> {
        validate_cookie_path(path)?;
        self.0.set_path(path.to_owned());
        Ok(self)
    }

    /// `name=value`, the form sent in a `Cookie` request header.
    pub(crate) fn encoded(&self) -> String {
        format!("{}={}", self.0.name(), self.0.value())
    }

    pub(crate) fn into_raw(self) -> cookie::Cookie<'static> {
        self.0
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.0.name())
            .field("value", &self.0.value())
            .field("domain", &self.0.domain())
            .field("path", &self.0.path())
            .finish()
    }
}

/// Parse `k=v; k2=v2` pair syntax. Malformed pairs reject the whole
/// string; each field passes the cookie validators.
pub(crate) fn parse_cookie_pairs(input: &str) -> Result<Vec<Cookie>, ValidationError> {
    let mut cookies = Vec::new();
    for pair in input.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((name, value)) = pair.split_once('=') else {
            return Err(ValidationError {
                field: "cookie",
                reason: format!("malformed pair {pair:?}"),
            });
        };
        cookies.push(Cookie::new(name.trim(), value.trim())?);
    }
    if cookies.is_empty() {
        return Err(ValidationError {
            field: "cookie",
            reason: "no cookie pairs found".into(),
        });
    }
    Ok(cookies)
}

/// A thread-safe cookie store shared by every request on a client.
///
/// Reads (replaying cookies onto requests) take a shared lock; only
/// `Set-Cookie` merges take the exclusive lock.
#[derive(Debug, Default)]
pub struct Jar(RwLock<cookie_store::CookieStore>);

impl Jar {
    /// An empty jar.
    #[must_use]
    pub fn new() -> Jar {
        Jar::default()
    }

    /// Seed the jar with one cookie string, as if `url` had set it.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        if let Ok(parsed) = cookie::Cookie::parse(cookie.to_owned()) {
            let mut store = self.0.write().expect("cookie jar poisoned");
            store.store_response_cookies(std::iter::once(parsed), url);
        }
    }

    /// Merge every `Set-Cookie` header from a response into the jar.
    pub(crate) fn store_response_cookies(&self, headers: &HeaderMap, url: &Url) {
        let cookies = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| cookie::Cookie::parse(value.to_owned()).ok());
        let mut store = self.0.write().expect("cookie jar poisoned");
        store.store_response_cookies(cookies, url);
    }

    /// The `Cookie` header value for `url`, or `None` when nothing
    /// matches.
    pub(crate) fn cookie_header_value(&self, url: &Url) -> Option<String> {
        let store = self.0.read().expect("cookie jar poisoned");
        let value = store
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}
