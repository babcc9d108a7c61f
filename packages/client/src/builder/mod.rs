//! Fluent request construction
//!
//! [`RequestBuilder`] methods are the option set: each validates its
//! input and writes into the request descriptor, applied in call order
//! (last write wins for a repeated header). The first failing option is
//! remembered and surfaced by [`send`](RequestBuilder::send) before any
//! network I/O happens.

use std::sync::Arc;
use std::time::Duration;

use base64::prelude::{Engine, BASE64_STANDARD};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::ClientInner;
use crate::cookie::{parse_cookie_pairs, Cookie};
use crate::download::{DownloadOptions, DownloadResult};
use crate::error::{self, Error};
use crate::execute;
use crate::request::{Body, FormData, RequestDescriptor};
use crate::response::HttpResult;
use crate::validation::credential::{
    validate_bearer_token, validate_password, validate_username,
};
use crate::validation::header::{validate_header_key, validate_header_value};
use crate::validation::query::{validate_query_key, validate_query_value};
use crate::validation::url::validate_url;

const MAX_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const MAX_RETRIES: u32 = 10;
const MAX_REDIRECTS: usize = 50;

/// Builds one request against a client.
#[must_use = "a RequestBuilder does nothing until send() or download()"]
pub struct RequestBuilder {
    inner: Arc<ClientInner>,
    request: Result<RequestDescriptor, Error>,
}

impl RequestBuilder {
    pub(crate) fn new(inner: Arc<ClientInner>, method: Method, url: &str) -> RequestBuilder {
        let request = validate_url(url)
            .map(|url| RequestDescriptor::new(method, url))
            .map_err(Error::from);
        RequestBuilder { inner, request }
    }

    fn map(mut self, apply: impl FnOnce(&mut RequestDescriptor) -> Result<(), Error>) -> Self {
        if let Ok(descriptor) = &mut self.request {
            if let Err(err) = apply(descriptor) {
                self.request = Err(err);
            }
        }
        self
    }

    /// Set one header after validating key and value.
    pub fn header(self, key: &str, value: &str) -> Self {
        let key = key.to_owned();
        let value = value.to_owned();
        self.map(move |descriptor| {
            validate_header_key(&key)?;
            validate_header_value(&key, &value)?;
            let name: HeaderName = key.parse().map_err(error::builder)?;
            let value = HeaderValue::from_str(&value).map_err(error::builder)?;
            descriptor.headers.insert(name, value);
            Ok(())
        })
    }

    /// Merge a set of headers; each pair is validated individually.
    pub fn headers<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in map {
            self = self.header(key.as_ref(), value.as_ref());
        }
        self
    }

    /// Override the client's `User-Agent` for this request.
    pub fn user_agent(self, agent: &str) -> Self {
        let agent = agent.to_owned();
        self.map(move |descriptor| {
            validate_header_value("user-agent", &agent)?;
            let value = HeaderValue::from_str(&agent).map_err(error::builder)?;
            descriptor.headers.insert(USER_AGENT, value);
            Ok(())
        })
    }

    /// Set `Content-Type`, overriding whatever the body implies.
    pub fn content_type(self, content_type: &str) -> Self {
        let content_type = content_type.to_owned();
        self.map(move |descriptor| {
            validate_header_value("content-type", &content_type)?;
            let value = HeaderValue::from_str(&content_type).map_err(error::builder)?;
            descriptor.headers.insert(CONTENT_TYPE, value);
            Ok(())
        })
    }

    /// Set the `Accept` header.
    pub fn accept(self, accept: &str) -> Self {
        let accept = accept.to_owned();
        self.map(move |descriptor| {
            validate_header_value("accept", &accept)?;
            let value = HeaderValue::from_str(&accept).map_err(error::builder)?;
            descriptor.headers.insert(ACCEPT, value);
            Ok(())
        })
    }

    /// `Accept: application/json`.
    pub fn accept_json(self) -> Self {
        self.accept("application/json")
    }

    /// `Accept: application/xml`.
    pub fn accept_xml(self) -> Self {
        self.accept("application/xml")
    }

    /// `Authorization: Bearer <token>` after token validation.
    pub fn bearer_auth(self, token: &str) -> Self {
        let token = token.to_owned();
        self.map(move |descriptor| {
            validate_bearer_token(&token)?;
            let mut value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(error::builder)?;
            value.set_sensitive(true);
            descriptor.headers.insert(AUTHORIZATION, value);
            Ok(())
        })
    }

    /// `Authorization: Basic <base64(user:password)>` after credential
    /// validation.
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let username = username.to_owned();
        let password = password.to_owned();
        self.map(move |descriptor| {
            validate_username(&username)?;
            validate_password(&password)?;
            let encoded = BASE64_STANDARD.encode(format!("{username}:{password}"));
            let mut value =
                HeaderValue::from_str(&format!("Basic {encoded}")).map_err(error::builder)?;
            value.set_sensitive(true);
            descriptor.headers.insert(AUTHORIZATION, value);
            Ok(())
        })
    }

    /// Append one query parameter.
    pub fn query(self, key: &str, value: impl ToString) -> Self {
        let key = key.to_owned();
        let value = value.to_string();
        self.map(move |descriptor| {
            validate_query_key(&key)?;
            validate_query_value(&value)?;
            descriptor.query.push((key, value));
            Ok(())
        })
    }

    /// Append a set of query parameters.
    pub fn query_map<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: ToString,
    {
        for (key, value) in map {
            self = self.query(key.as_ref(), value);
        }
        self
    }

    /// JSON body (`application/json`). Replaces any previous body.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let value = serde_json::to_value(value).map_err(error::builder);
        self.map(move |descriptor| {
            descriptor.body = Body::Json(value?);
            Ok(())
        })
    }

    /// Pre-rendered XML body (`application/xml`).
    pub fn xml(self, xml: impl Into<String>) -> Self {
        let xml = xml.into();
        self.map(move |descriptor| {
            descriptor.body = Body::Xml(xml);
            Ok(())
        })
    }

    /// Plain text body (`text/plain`).
    pub fn text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.map(move |descriptor| {
            descriptor.body = Body::Text(text);
            Ok(())
        })
    }

    /// Form-encoded body (`application/x-www-form-urlencoded`).
    pub fn form<K, V>(self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(String, String)> = fields
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();
        self.map(move |descriptor| {
            descriptor.body = Body::Form(pairs);
            Ok(())
        })
    }

    /// Binary body with an optional `Content-Type` (defaults to
    /// `application/octet-stream`).
    pub fn binary(self, bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        let bytes = bytes.into();
        let content_type = content_type.map(str::to_owned);
        self.map(move |descriptor| {
            if let Some(ct) = &content_type {
                validate_header_value("content-type", ct)?;
            }
            descriptor.body = Body::Bytes(bytes, content_type);
            Ok(())
        })
    }

    /// Raw body bytes; framing is the caller's business, no
    /// `Content-Type` is implied.
    pub fn body(self, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        self.map(move |descriptor| {
            descriptor.body = Body::Raw(bytes);
            Ok(())
        })
    }

    /// Multipart body (`multipart/form-data`).
    pub fn form_data(self, form: FormData) -> Self {
        self.map(move |descriptor| {
            descriptor.body = Body::Multipart(form);
            Ok(())
        })
    }

    /// Attach one file as a multipart body. Appends when the body is
    /// already multipart, otherwise starts a fresh form.
    pub fn file(self, field: &str, filename: &str, content: impl Into<Bytes>) -> Self {
        let field = field.to_owned();
        let filename = filename.to_owned();
        let content = content.into();
        self.map(move |descriptor| {
            let form = match std::mem::take(&mut descriptor.body) {
                Body::Multipart(existing) => existing,
                _ => FormData::new(),
            };
            descriptor.body = Body::Multipart(form.file(field, filename, content, None));
            Ok(())
        })
    }

    /// Per-request total timeout override; up to 30 minutes.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(move |descriptor| {
            if timeout.is_zero() || timeout > MAX_TIMEOUT {
                return Err(error::builder(
                    "timeout must be positive and at most 30 minutes",
                ));
            }
            descriptor.timeout = Some(timeout);
            Ok(())
        })
    }

    /// Attach a cancellation context; cancelling it aborts any sleep or
    /// in-flight I/O for this request.
    pub fn context(self, token: CancellationToken) -> Self {
        self.map(move |descriptor| {
            descriptor.context = Some(token);
            Ok(())
        })
    }

    /// Per-request retry budget override; up to 10.
    pub fn max_retries(self, retries: u32) -> Self {
        self.map(move |descriptor| {
            if retries > MAX_RETRIES {
                return Err(error::builder("max_retries must be at most 10"));
            }
            descriptor.max_retries = Some(retries);
            Ok(())
        })
    }

    /// Attach a validated cookie.
    pub fn cookie(self, cookie: Cookie) -> Self {
        self.map(move |descriptor| {
            descriptor.cookies.push(cookie);
            Ok(())
        })
    }

    /// Attach several cookies in order.
    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        for cookie in cookies {
            self = self.cookie(cookie);
        }
        self
    }

    /// Build and attach a cookie from a name/value pair.
    pub fn cookie_value(self, name: &str, value: &str) -> Self {
        let name = name.to_owned();
        let value = value.to_owned();
        self.map(move |descriptor| {
            descriptor.cookies.push(Cookie::new(&name, &value)?);
            Ok(())
        })
    }

    /// Parse `k=v; k2=v2` syntax and attach every pair; malformed input
    /// rejects the whole string.
    pub fn cookie_string(self, pairs: &str) -> Self {
        let pairs = pairs.to_owned();
        self.map(move |descriptor| {
            descriptor.cookies.extend(parse_cookie_pairs(&pairs)?);
            Ok(())
        })
    }

    /// Per-request redirect-following override.
    pub fn follow_redirects(self, follow: bool) -> Self {
        self.map(move |descriptor| {
            descriptor.follow_redirects = Some(follow);
            Ok(())
        })
    }

    /// Per-request redirect limit override; up to 50.
    pub fn max_redirects(self, max: usize) -> Self {
        self.map(move |descriptor| {
            if max > MAX_REDIRECTS {
                return Err(error::builder("max_redirects must be at most 50"));
            }
            descriptor.max_redirects = Some(max);
            Ok(())
        })
    }

    /// Execute the request through the engine.
    pub async fn send(self) -> Result<HttpResult, Error> {
        let descriptor = self.request?;
        self.inner.ensure_open()?;
        execute::execute(&self.inner, descriptor).await
    }

    /// Execute and stream the response body to a file.
    pub async fn download(self, options: DownloadOptions) -> Result<DownloadResult, Error> {
        let descriptor = self.request?;
        self.inner.ensure_open()?;
        crate::download::download(&self.inner, descriptor, options).await
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.request {
            Ok(descriptor) => f
                .debug_struct("RequestBuilder")
                .field("method", descriptor.method())
                .field("url", &crate::validation::url::sanitize_url(descriptor.url()).as_str())
                .finish(),
            Err(err) => f.debug_struct("RequestBuilder").field("error", err).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::HttpClient;

    #[tokio::test]
    async fn invalid_url_surfaces_at_send() {
        let client = HttpClient::new();
        let err = client.get("ftp://example.com/file").send().await.unwrap_err();
        assert!(err.is_builder(), "{err:?}");
        let err = client.get("").send().await.unwrap_err();
        assert!(err.is_builder(), "{err:?}");
    }

    #[tokio::test]
    async fn first_failing_option_is_kept() {
        let client = HttpClient::new();
        // The bad header fails first; later options cannot repair it.
        let err = client
            .get("http://example.com/")
            .header("Transfer-Encoding", "chunked")
            .header("X-Fine", "ok")
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder(), "{err:?}");
        assert!(err.to_string().contains("managed"), "{err}");
    }

    #[tokio::test]
    async fn option_range_checks() {
        let client = HttpClient::new();
        let err = client
            .get("http://example.com/")
            .max_retries(11)
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder());

        let err = client
            .get("http://example.com/")
            .timeout(std::time::Duration::from_secs(31 * 60))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder());

        let err = client
            .get("http://example.com/")
            .max_redirects(51)
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder());
    }
}
