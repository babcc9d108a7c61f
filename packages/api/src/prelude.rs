//! One-line import for common usage.
//!
//! ```no_run
//! use httpc::prelude::*;
//! ```

pub use httpc_client::{
    CancellationToken, Cookie, DownloadOptions, DownloadResult, Error, FormData, HttpClient,
    HttpConfig, HttpResult, RequestBuilder, Result,
};

pub use crate::{close_default_client, default_client, set_default_client};
