//! File downloads
//!
//! Streams a response body to disk through the execution engine, layering
//! destination validation, resume (`Range`) negotiation, 416 handling and
//! rate-limited progress reporting on top of the normal pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use http::{HeaderValue, StatusCode};
use http_body_util::BodyExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::client::ClientInner;
use crate::error::{self, Error};
use crate::execute;
use crate::request::RequestDescriptor;
use crate::validation::path::validate_download_path;

/// Progress observer: `(bytes_downloaded, total_bytes, bytes_per_second)`.
/// `bytes_downloaded` includes the resume offset; `total_bytes` is `None`
/// when the server did not advertise a length.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>, f64) + Send + Sync>;

/// Options for [`HttpClient::download_with_options`](crate::client::HttpClient::download_with_options).
#[derive(Clone)]
pub struct DownloadOptions {
    pub(crate) path: String,
    pub(crate) overwrite: bool,
    pub(crate) resume: bool,
    pub(crate) progress: Option<ProgressCallback>,
    pub(crate) progress_interval: Duration,
}

impl DownloadOptions {
    /// Download to `path`. Fails if the destination exists unless
    /// `overwrite` or `resume` is set.
    #[must_use]
    pub fn new(path: impl Into<String>) -> DownloadOptions {
        DownloadOptions {
            path: path.into(),
            overwrite: false,
            resume: false,
            progress: None,
            progress_interval: Duration::from_millis(500),
        }
    }

    /// Replace the destination if it exists.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> DownloadOptions {
        self.overwrite = overwrite;
        self
    }

    /// Resume from the destination's current size with a `Range` request.
    #[must_use]
    pub fn resume(mut self, resume: bool) -> DownloadOptions {
        self.resume = resume;
        self
    }

    /// Observe progress. Invoked at most once per progress interval.
    #[must_use]
    pub fn progress<F>(mut self, callback: F) -> DownloadOptions
    where
        F: Fn(u64, Option<u64>, f64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Minimum spacing between progress callbacks. Default 500 ms.
    #[must_use]
    pub fn progress_interval(mut self, interval: Duration) -> DownloadOptions {
        self.progress_interval = interval;
        self
    }
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("path", &self.path)
            .field("overwrite", &self.overwrite)
            .field("resume", &self.resume)
            .field("has_progress", &self.progress.is_some())
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

/// Outcome of a finished download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    path: PathBuf,
    bytes_written: u64,
    duration: Duration,
    average_speed: f64,
    status: StatusCode,
    content_length: Option<u64>,
    resumed: bool,
}

impl DownloadResult {
    /// The destination path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Bytes written by this call (excludes any resume offset).
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Wall-clock time for the whole download.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Average throughput in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }

    /// The response status (200, 206, or 416 for an already-complete
    /// resume).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The advertised total size, when the server provided one.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// True if the server honored the resume request with 206.
    #[must_use]
    pub fn resumed(&self) -> bool {
        self.resumed
    }
}

pub(crate) async fn download(
    inner: &ClientInner,
    mut descriptor: RequestDescriptor,
    options: DownloadOptions,
) -> Result<DownloadResult, Error> {
    let path = validate_download_path(&options.path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(error::file)?;
    }

    let existing_size = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Some(metadata.len()),
        Ok(_) => return Err(error::file("destination exists and is not a file")),
        Err(_) => None,
    };
    let offset = match existing_size {
        Some(_) if !options.overwrite && !options.resume => {
            return Err(error::file_exists());
        }
        Some(size) if options.resume && size > 0 => {
            let range = HeaderValue::from_str(&format!("bytes={size}-"))
                .map_err(error::builder)?;
            descriptor.headers.insert(RANGE, range);
            size
        }
        _ => 0,
    };

    // Downloads write wire bytes verbatim; compressed transfer would
    // break Range arithmetic and resumed offsets.
    descriptor
        .headers
        .entry(ACCEPT_ENCODING)
        .or_insert_with(|| HeaderValue::from_static("identity"));

    let url = descriptor.url.clone();
    let streaming = execute::execute_streaming(inner, descriptor).await?;
    let started = streaming.started;
    let attempts = streaming.attempts;
    let context = streaming.context.clone();
    let (parts, body, host_permit) = streaming.into_parts();

    let status = parts.status;
    let (mut file, resumed) = match status {
        StatusCode::PARTIAL_CONTENT => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .await
                .map_err(error::file)?;
            (file, true)
        }
        StatusCode::OK => (File::create(&path).await.map_err(error::file)?, false),
        StatusCode::RANGE_NOT_SATISFIABLE => {
            // The file already covers the full entity; nothing to fetch.
            drop(body);
            drop(host_permit);
            return Ok(DownloadResult {
                path,
                bytes_written: 0,
                duration: started.elapsed(),
                average_speed: 0.0,
                status,
                content_length: None,
                resumed: false,
            });
        }
        other => {
            return Err(error::status_code(other)
                .with_attempts(attempts)
                .with_url(&url));
        }
    };

    let total = total_size(&parts.headers, offset, resumed);
    let mut body = body;
    let mut written: u64 = 0;
    let mut reporter = ProgressReporter::new(
        options.progress.clone(),
        options.progress_interval,
        offset,
        total,
    );

    while let Some(frame) = next_frame(&mut body, context.as_ref()).await? {
        if let Ok(data) = frame.into_data() {
            file.write_all(&data).await.map_err(error::file)?;
            written += data.len() as u64;
            reporter.observe(written);
        }
    }
    file.flush().await.map_err(error::file)?;
    drop(host_permit);
    inner.stats.record_bytes_received(written);

    let duration = started.elapsed();
    let average_speed = if duration.as_secs_f64() > 0.0 {
        written as f64 / duration.as_secs_f64()
    } else {
        0.0
    };
    reporter.finish(written);
    tracing::debug!(
        path = %path.display(),
        bytes = written,
        resumed,
        "download complete"
    );

    Ok(DownloadResult {
        path,
        bytes_written: written,
        duration,
        average_speed,
        status,
        content_length: total,
        resumed,
    })
}

/// Pull the next body frame, honoring the caller's cancellation context.
async fn next_frame(
    body: &mut hyper::body::Incoming,
    ctx: Option<&tokio_util::sync::CancellationToken>,
) -> Result<Option<http_body::Frame<bytes::Bytes>>, Error> {
    let fut = body.frame();
    let next = match ctx {
        Some(token) => tokio::select! {
            _ = token.cancelled() => return Err(error::canceled()),
            frame = fut => frame,
        },
        None => fut.await,
    };
    match next {
        None => Ok(None),
        Some(Ok(frame)) => Ok(Some(frame)),
        Some(Err(cause)) => Err(error::request(cause)),
    }
}

/// Total entity size: `Content-Range: bytes a-b/total` when resuming,
/// otherwise `Content-Length` plus the resume offset.
fn total_size(headers: &http::HeaderMap, offset: u64, resumed: bool) -> Option<u64> {
    if resumed {
        if let Some(total) = headers
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit_once('/'))
            .and_then(|(_, total)| total.parse().ok())
        {
            return Some(total);
        }
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| len + if resumed { offset } else { 0 })
}

/// Rate-limited progress emission with instantaneous speed.
struct ProgressReporter {
    callback: Option<ProgressCallback>,
    interval: Duration,
    offset: u64,
    total: Option<u64>,
    last_emit: Instant,
    last_bytes: u64,
}

impl ProgressReporter {
    fn new(
        callback: Option<ProgressCallback>,
        interval: Duration,
        offset: u64,
        total: Option<u64>,
    ) -> ProgressReporter {
        ProgressReporter {
            callback,
            interval,
            offset,
            total,
            last_emit: Instant::now(),
            last_bytes: 0,
        }
    }

    fn observe(&mut self, written: u64) {
        let Some(callback) = &self.callback else {
            return;
        };
        let elapsed = self.last_emit.elapsed();
        if elapsed < self.interval {
            return;
        }
        let speed = (written - self.last_bytes) as f64 / elapsed.as_secs_f64();
        callback(self.offset + written, self.total, speed);
        self.last_emit = Instant::now();
        self.last_bytes = written;
    }

    fn finish(&mut self, written: u64) {
        if let Some(callback) = &self.callback {
            let elapsed = self.last_emit.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                (written - self.last_bytes) as f64 / elapsed
            } else {
                0.0
            };
            callback(self.offset + written, self.total, speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_size_prefers_content_range() {
        let mut headers = http::HeaderMap::new();
        headers.insert(CONTENT_RANGE, "bytes 512-1023/1024".parse().unwrap());
        headers.insert(CONTENT_LENGTH, "512".parse().unwrap());
        assert_eq!(total_size(&headers, 512, true), Some(1024));
        // Plain 200 download reports the advertised length directly.
        assert_eq!(total_size(&headers, 0, false), Some(512));
    }

    #[test]
    fn options_builder_defaults() {
        let options = DownloadOptions::new("out/file.bin");
        assert!(!options.overwrite);
        assert!(!options.resume);
        assert!(options.progress.is_none());
        assert_eq!(options.progress_interval, Duration::from_millis(500));
    }
}
