//! The HTTP client
//!
//! [`HttpClient`] owns everything shared across requests: the validated
//! config snapshot, the hyper-util connection pool, the proxy matcher,
//! the optional cookie jar, admission semaphores and counters. Cloning is
//! cheap (one `Arc`); every method is safe to call concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use http_body_util::Full;
use hyper_util::client::legacy;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::builder::RequestBuilder;
use crate::config::HttpConfig;
use crate::connect::Connector;
use crate::cookie::Jar;
use crate::dns::DynResolver;
use crate::download::{DownloadOptions, DownloadResult};
use crate::error::{self, Error};
use crate::execute::admission::Admission;
use crate::proxy::Matcher;

use super::stats::{ClientStats, StatsSnapshot};

pub(crate) type HyperClient = legacy::Client<Connector, Full<Bytes>>;

/// Shared state behind an [`HttpClient`].
pub(crate) struct ClientInner {
    pub(crate) config: HttpConfig,
    pub(crate) hyper: HyperClient,
    pub(crate) matcher: Arc<Matcher>,
    pub(crate) jar: Option<Arc<Jar>>,
    pub(crate) admission: Admission,
    pub(crate) stats: ClientStats,
    pub(crate) static_headers: HeaderMap,
    closed: AtomicBool,
}

impl ClientInner {
    pub(crate) fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(error::builder("client is closed"));
        }
        Ok(())
    }
}

/// An HTTP/1.1 + HTTP/2 client.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    /// A client with the default configuration.
    ///
    /// # Panics
    ///
    /// Never in practice: the default configuration always validates.
    #[must_use]
    pub fn new() -> HttpClient {
        HttpClient::with_config(HttpConfig::default()).expect("default config is valid")
    }

    /// A client from an explicit configuration. The config is validated
    /// and moved in; later changes to a caller-held copy have no effect
    /// on the running client.
    pub fn with_config(config: HttpConfig) -> Result<HttpClient, Error> {
        config.validate()?;

        let mut static_headers = HeaderMap::new();
        for (key, value) in &config.protocol.default_headers {
            let name: HeaderName = key.parse().map_err(error::builder)?;
            let value = HeaderValue::from_str(value).map_err(error::builder)?;
            static_headers.append(name, value);
        }

        let matcher = Arc::new(Matcher::from_config(&config.proxy)?);
        let connector = Connector::new(&config, Arc::clone(&matcher), DynResolver::gai())?;

        let idle_per_host = config
            .pool
            .max_connections_per_host
            .min(config.pool.max_idle_connections)
            .max(1);
        let hyper = legacy::Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(idle_per_host)
            .pool_idle_timeout(config.timeouts.idle_connection)
            .pool_timer(TokioTimer::new())
            .timer(TokioTimer::new())
            .build(connector);

        let jar = config
            .protocol
            .enable_cookies
            .then(|| Arc::new(Jar::new()));
        let admission = Admission::new(&config.pool);

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                config,
                hyper,
                matcher,
                jar,
                admission,
                stats: ClientStats::new(),
                static_headers,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Start a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a HEAD request.
    pub fn head(&self, url: &str) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start an OPTIONS request.
    pub fn options(&self, url: &str) -> RequestBuilder {
        self.request(Method::OPTIONS, url)
    }

    /// Start a request with an arbitrary method.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.inner), method, url)
    }

    /// Download `url` to `path` with default options (no overwrite, no
    /// resume).
    pub async fn download_file(&self, url: &str, path: &str) -> Result<DownloadResult, Error> {
        self.download_with_options(url, DownloadOptions::new(path))
            .await
    }

    /// Download `url` with explicit [`DownloadOptions`].
    pub async fn download_with_options(
        &self,
        url: &str,
        options: DownloadOptions,
    ) -> Result<DownloadResult, Error> {
        self.get(url).download(options).await
    }

    /// The cookie jar, when cookies are enabled in config.
    #[must_use]
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.inner.jar.as_ref()
    }

    /// The configuration this client runs with.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }

    /// A snapshot of the client's counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Refuse new requests. In-flight requests finish; pooled
    /// connections are released when the last clone drops.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// True once [`close`](HttpClient::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Default for HttpClient {
    fn default() -> HttpClient {
        HttpClient::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("http2", &self.inner.config.protocol.enable_http2)
            .field("cookies", &self.inner.jar.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = HttpConfig::default();
        config.retry.max_retries = 99;
        assert!(HttpClient::with_config(config).unwrap_err().is_config());
    }

    #[tokio::test]
    async fn closed_client_refuses_requests() {
        let client = HttpClient::new();
        client.close();
        assert!(client.is_closed());
        let err = client
            .get("http://example.com/")
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder());
    }

    #[test]
    fn clones_share_state() {
        let client = HttpClient::new();
        let clone = client.clone();
        client.close();
        assert!(clone.is_closed());
    }
}
