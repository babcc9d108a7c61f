//! Request descriptor
//!
//! A [`RequestDescriptor`] is created per call, mutated by the builder's
//! option methods, frozen when execution starts, and discarded afterwards.

mod body;
mod multipart;

use std::time::Duration;

use http::{HeaderMap, Method};
use tokio_util::sync::CancellationToken;
use url::Url;

pub use body::{Body, FormData};

/// Everything the engine needs to dispatch one request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Body,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_retries: Option<u32>,
    pub(crate) context: Option<CancellationToken>,
    pub(crate) cookies: Vec<crate::cookie::Cookie>,
    pub(crate) follow_redirects: Option<bool>,
    pub(crate) max_redirects: Option<usize>,
}

impl RequestDescriptor {
    pub(crate) fn new(method: Method, url: Url) -> RequestDescriptor {
        RequestDescriptor {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: Body::None,
            timeout: None,
            max_retries: None,
            context: None,
            cookies: Vec::new(),
            follow_redirects: None,
            max_redirects: None,
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URL, query parameters not yet applied.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fold collected query parameters into the URL. Called once when the
    /// descriptor is frozen for dispatch.
    pub(crate) fn apply_query(&mut self) {
        if self.query.is_empty() {
            return;
        }
        let mut pairs = self.url.query_pairs_mut();
        for (key, value) in self.query.drain(..) {
            pairs.append_pair(&key, &value);
        }
    }
}
