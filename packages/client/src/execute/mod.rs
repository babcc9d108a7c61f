//! Request execution engine
//!
//! The per-request pipeline: build → validate → SSRF pre-DNS check →
//! admission → retry loop. Each attempt dispatches through the pooled
//! transport, chases redirects under the policy, decodes gzip/deflate and
//! captures the body under the configured size cap. Classification
//! decides between returning, retrying with backoff, or failing.

pub(crate) mod admission;

use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::FutureExt;
use http::header::{
    HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
    COOKIE, LOCATION, PROXY_AUTHORIZATION, USER_AGENT,
};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use tokio::sync::OwnedSemaphorePermit;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::ClientInner;
use crate::error::{self, classification::is_retryable_status, Error, SsrfViolation};
use crate::redirect::{self, ActionKind, Policy, TooManyRedirects};
use crate::request::{Body, RequestDescriptor};
use crate::response::{self, HttpResult, RequestInfo, ResponseInfo, ResponseMeta};
use crate::retry::{parse_retry_after, RetryPolicy};
use crate::validation::header::validate_header_value;
use crate::validation::ip::{is_blocked_ip, is_localhost_name};
use crate::validation::url::{sanitize_url, validate_url};

use admission::origin_of;

/// Extra bytes consumed after an over-limit abort so the connection can
/// still be returned to the pool when the tail is short.
const DRAIN_ALLOWANCE: u64 = 256 * 1024;

const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate";

/// A response handed over before its body is consumed, for streaming
/// consumers (downloads). Dropping it releases the per-origin permit.
pub(crate) struct StreamingResponse {
    pub(crate) parts: http::response::Parts,
    pub(crate) body: Incoming,
    pub(crate) request_info: RequestInfo,
    pub(crate) attempts: u32,
    pub(crate) redirect_chain: Vec<Url>,
    pub(crate) started: Instant,
    pub(crate) context: Option<CancellationToken>,
    host_permit: Option<OwnedSemaphorePermit>,
}

impl StreamingResponse {
    pub(crate) fn into_parts(
        self,
    ) -> (
        http::response::Parts,
        Incoming,
        Option<OwnedSemaphorePermit>,
    ) {
        (self.parts, self.body, self.host_permit)
    }
}

/// Run the full pipeline and capture the body.
pub(crate) async fn execute(
    inner: &ClientInner,
    descriptor: RequestDescriptor,
) -> Result<HttpResult, Error> {
    let plan = Plan::build(inner, descriptor)?;
    let url = plan.url.clone();
    let started = Instant::now();
    inner.stats.record_request();

    let outcome = retry_loop(inner, plan, started, CaptureMode::Buffered).await;
    match outcome {
        Ok(RunOutcome::Captured(result)) => {
            inner.stats.record_success();
            Ok(result)
        }
        Ok(RunOutcome::Streaming(_)) => unreachable!("buffered mode yields captured outcomes"),
        Err(err) => {
            inner.stats.record_failure();
            Err(err.with_url(&url))
        }
    }
}

/// Run the pipeline but stop before consuming the final body.
pub(crate) async fn execute_streaming(
    inner: &ClientInner,
    descriptor: RequestDescriptor,
) -> Result<StreamingResponse, Error> {
    let plan = Plan::build(inner, descriptor)?;
    let url = plan.url.clone();
    let started = Instant::now();
    inner.stats.record_request();

    match retry_loop(inner, plan, started, CaptureMode::Streaming).await {
        Ok(RunOutcome::Streaming(streaming)) => Ok(streaming),
        Ok(RunOutcome::Captured(_)) => unreachable!("streaming mode yields streaming outcomes"),
        Err(err) => {
            inner.stats.record_failure();
            Err(err.with_url(&url))
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CaptureMode {
    Buffered,
    Streaming,
}

enum RunOutcome {
    Captured(HttpResult),
    Streaming(StreamingResponse),
}

/// The frozen request plan produced by the build and validate stages.
struct Plan {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Body,
    cookies: Vec<crate::cookie::Cookie>,
    timeout: Duration,
    retry: RetryPolicy,
    redirect: Policy,
    context: Option<CancellationToken>,
}

impl Plan {
    /// Stages 1–3: merge headers and effective settings, re-validate
    /// inputs, and apply the pre-DNS SSRF check.
    fn build(inner: &ClientInner, mut descriptor: RequestDescriptor) -> Result<Plan, Error> {
        descriptor.apply_query();

        // Header precedence: config static < client user-agent < request.
        let mut headers = inner.static_headers.clone();
        for (name, value) in &descriptor.headers {
            headers.insert(name.clone(), value.clone());
        }
        if !headers.contains_key(USER_AGENT) {
            let agent = HeaderValue::from_str(&inner.config.protocol.user_agent)
                .map_err(error::builder)?;
            headers.insert(USER_AGENT, agent);
        }

        // Re-validate at the engine boundary: descriptors can be built
        // programmatically, not only through the checked builder.
        validate_url(descriptor.url.as_str())?;
        for (name, value) in &headers {
            let value = value.to_str().map_err(error::builder)?;
            validate_header_value(name.as_str(), value)?;
        }
        for cookie in &descriptor.cookies {
            crate::validation::cookie::validate_cookie_name(cookie.name())?;
            crate::validation::cookie::validate_cookie_value(cookie.value())?;
        }

        if !inner.config.security.allow_private_ips {
            pre_dns_check(&descriptor.url)?;
        }

        let follow = descriptor
            .follow_redirects
            .unwrap_or(inner.config.protocol.follow_redirects);
        let max_redirects = descriptor
            .max_redirects
            .unwrap_or(inner.config.protocol.max_redirects);
        let redirect = if follow {
            Policy::limited(max_redirects)
        } else {
            Policy::none()
        };

        Ok(Plan {
            method: descriptor.method,
            url: descriptor.url,
            headers,
            body: descriptor.body,
            cookies: descriptor.cookies,
            timeout: descriptor.timeout.unwrap_or(inner.config.timeouts.request),
            retry: RetryPolicy::new(&inner.config.retry, descriptor.max_retries),
            redirect,
            context: descriptor.context,
        })
    }
}

/// Pre-DNS half of the SSRF policy: IP-literal hosts and loopback names
/// are rejected before any packet leaves.
fn pre_dns_check(url: &Url) -> Result<(), Error> {
    match url.host() {
        Some(url::Host::Ipv4(ip)) if is_blocked_ip(ip.into()) => {
            Err(error::ssrf(SsrfViolation { addr: ip.into() }))
        }
        Some(url::Host::Ipv6(ip)) if is_blocked_ip(ip.into()) => {
            Err(error::ssrf(SsrfViolation { addr: ip.into() }))
        }
        Some(url::Host::Domain(domain)) if is_localhost_name(domain) => Err(error::ssrf(
            format!("host {domain:?} names the loopback interface"),
        )),
        _ => Ok(()),
    }
}

/// Stages 4–5: admission, then the retry loop around redirect chasing.
async fn retry_loop(
    inner: &ClientInner,
    plan: Plan,
    started: Instant,
    mode: CaptureMode,
) -> Result<RunOutcome, Error> {
    if let Some(token) = &plan.context {
        if token.is_cancelled() {
            return Err(error::canceled().with_attempts(0));
        }
    }
    let _global_permit = inner
        .admission
        .acquire_global(plan.context.as_ref())
        .await?;

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let attempt_started = Instant::now();
        match dispatch_with_redirects(inner, &plan, attempt_started).await {
            Ok(hop) => {
                let status = hop.parts.status;
                let can_retry =
                    is_retryable_status(status) && attempts <= plan.retry.max_retries;
                if can_retry {
                    let retry_after = parse_retry_after(&hop.parts.headers);
                    let remaining = remaining_budget(plan.timeout, attempt_started);
                    let _ = with_limits(plan.context.as_ref(), remaining, async {
                        drain(hop.body, DRAIN_ALLOWANCE).await;
                        Ok::<(), Error>(())
                    })
                    .await;
                    // Other requests may use this origin while we back off.
                    drop(hop.host_permit);
                    let delay = plan.retry.backoff_delay(attempts - 1, retry_after);
                    tracing::debug!(
                        status = status.as_u16(),
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        url = %sanitize_url(&plan.url),
                        "retrying after retryable status"
                    );
                    inner.stats.record_retry();
                    backoff_sleep(delay, plan.context.as_ref())
                        .await
                        .map_err(|e| e.with_attempts(attempts))?;
                    continue;
                }
                return finish_hop(inner, &plan, hop, attempts, started, mode).await;
            }
            Err(err) => {
                if err.is_retryable() && attempts <= plan.retry.max_retries {
                    let delay = plan.retry.backoff_delay(attempts - 1, None);
                    tracing::debug!(
                        error = %err,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transport failure"
                    );
                    inner.stats.record_retry();
                    backoff_sleep(delay, plan.context.as_ref())
                        .await
                        .map_err(|e| e.with_attempts(attempts))?;
                    continue;
                }
                return Err(err.with_attempts(attempts));
            }
        }
    }
}

/// One finished hop: response split apart with its request echo and the
/// still-held per-origin permit.
struct HopOutput {
    parts: http::response::Parts,
    body: Incoming,
    request_info: RequestInfo,
    redirect_chain: Vec<Url>,
    attempt_started: Instant,
    host_permit: Option<OwnedSemaphorePermit>,
}

async fn finish_hop(
    inner: &ClientInner,
    plan: &Plan,
    hop: HopOutput,
    attempts: u32,
    started: Instant,
    mode: CaptureMode,
) -> Result<RunOutcome, Error> {
    match mode {
        CaptureMode::Streaming => Ok(RunOutcome::Streaming(StreamingResponse {
            parts: hop.parts,
            body: hop.body,
            request_info: hop.request_info,
            attempts,
            redirect_chain: hop.redirect_chain,
            started,
            context: plan.context.clone(),
            host_permit: hop.host_permit,
        })),
        CaptureMode::Buffered => {
            let remaining = remaining_budget(plan.timeout, hop.attempt_started);
            let limit = inner.config.security.max_response_body_size;
            let size_hint = content_length_of(&hop.parts.headers);
            let (raw, transferred) = with_limits(
                plan.context.as_ref(),
                remaining,
                read_body(hop.body, limit, size_hint),
            )
            .await
            .map_err(|e| e.with_attempts(attempts))?;
            drop(hop.host_permit);

            let mut headers = hop.parts.headers;
            if inner.config.security.strict_content_length {
                let final_method = hop.request_info.method().clone();
                check_content_length(&headers, final_method, hop.parts.status, transferred)
                    .map_err(|e| e.with_attempts(attempts))?;
            }
            let decoder = response::decoder_for(&headers);
            let body = if decoder == response::ContentDecoder::Identity {
                raw
            } else {
                let decoded = response::decode(decoder, raw, limit)
                    .map_err(|e| e.with_attempts(attempts))?;
                // The stored body no longer matches the wire framing.
                headers.remove(CONTENT_ENCODING);
                headers.remove(CONTENT_LENGTH);
                decoded
            };
            inner.stats.record_bytes_received(transferred);

            let response_info = ResponseInfo::new(
                hop.parts.status,
                headers,
                body,
                size_hint,
            );
            let meta = ResponseMeta::new(started.elapsed(), attempts, hop.redirect_chain);
            Ok(RunOutcome::Captured(HttpResult::new(
                hop.request_info,
                response_info,
                meta,
            )))
        }
    }
}

/// Dispatch one attempt, following redirects under the plan's policy.
async fn dispatch_with_redirects(
    inner: &ClientInner,
    plan: &Plan,
    attempt_started: Instant,
) -> Result<HopOutput, Error> {
    let mut method = plan.method.clone();
    let mut url = plan.url.clone();
    let mut template = plan.headers.clone();
    let mut body = plan.body.clone();
    let mut chain: Vec<Url> = Vec::new();

    loop {
        let host_permit = inner
            .admission
            .acquire_host(origin_of(&url), plan.context.as_ref())
            .await?;

        let (body_bytes, implied_ct) = body.serialize()?;
        let hop_headers = build_hop_headers(inner, &template, &url, implied_ct, &plan.cookies)?;

        let dispatch_url = strip_userinfo(&url);
        let uri: http::Uri = dispatch_url
            .as_str()
            .parse()
            .map_err(error::builder)?;
        let mut request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Full::new(body_bytes))
            .map_err(error::builder)?;
        *request.headers_mut() = hop_headers.clone();

        // The dispatch phase (connect, write, header read) is additionally
        // bounded by the per-phase timeouts; body capture spends whatever
        // attempt budget is left afterwards.
        let dispatch_budget = {
            let timeouts = &inner.config.timeouts;
            let header_phase = timeouts
                .connect
                .saturating_add(timeouts.tls_handshake)
                .saturating_add(timeouts.response_header);
            remaining_budget(plan.timeout, attempt_started).min(header_phase)
        };
        tracing::trace!(method = %method, url = %sanitize_url(&url), "dispatching");
        let response =
            dispatch_once(inner, request, dispatch_budget, plan.context.as_ref()).await?;

        if let Some(jar) = &inner.jar {
            jar.store_response_cookies(response.headers(), &url);
        }

        let status = response.status();
        if is_followable_redirect(status) && response.headers().contains_key(LOCATION) {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| error::redirect("Location header is not valid text"))?;
            let next = url.join(location).map_err(error::redirect)?;
            match next.scheme() {
                "http" | "https" => {}
                other => {
                    return Err(error::redirect(format!(
                        "redirect to unsupported scheme {other:?}"
                    )))
                }
            }

            match plan.redirect.check(status, &next, &chain) {
                ActionKind::Follow => {
                    if !inner.config.security.allow_private_ips {
                        pre_dns_check(&next)?;
                    }
                    chain.push(url.clone());
                    tracing::debug!(
                        status = status.as_u16(),
                        to = %sanitize_url(&next),
                        hops = chain.len(),
                        "following redirect"
                    );
                    // Drain this hop so its connection can be pooled.
                    let remaining = remaining_budget(plan.timeout, attempt_started);
                    let _ = with_limits(plan.context.as_ref(), remaining, async {
                        drain(response.into_body(), DRAIN_ALLOWANCE).await;
                        Ok::<(), Error>(())
                    })
                    .await;
                    drop(host_permit);

                    let (next_method, keep_body) = redirect_method(status, &method);
                    if !keep_body {
                        body = Body::None;
                        template.remove(CONTENT_TYPE);
                    }
                    method = next_method;
                    redirect::remove_sensitive_headers(&mut template, &next, &chain);
                    url = next;
                    continue;
                }
                ActionKind::Stop => {
                    let request_info =
                        RequestInfo::new(method, &url, hop_headers, plan.cookies.clone());
                    let (parts, incoming) = response.into_parts();
                    return Ok(HopOutput {
                        parts,
                        body: incoming,
                        request_info,
                        redirect_chain: chain,
                        attempt_started,
                        host_permit,
                    });
                }
                ActionKind::Error(cause) => {
                    return if cause.is::<TooManyRedirects>() {
                        Err(error::too_many_redirects())
                    } else {
                        Err(error::redirect(cause))
                    };
                }
            }
        }

        let request_info = RequestInfo::new(method, &url, hop_headers, plan.cookies.clone());
        let (parts, incoming) = response.into_parts();
        return Ok(HopOutput {
            parts,
            body: incoming,
            request_info,
            redirect_chain: chain,
            attempt_started,
            host_permit,
        });
    }
}

/// Assemble the headers for one hop from the merged template.
fn build_hop_headers(
    inner: &ClientInner,
    template: &HeaderMap,
    url: &Url,
    implied_content_type: Option<String>,
    cookies: &[crate::cookie::Cookie],
) -> Result<HeaderMap, Error> {
    let mut headers = template.clone();

    if !headers.contains_key(ACCEPT_ENCODING) {
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
    }
    if let Some(content_type) = implied_content_type {
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_str(&content_type).map_err(error::builder)?,
            );
        }
    }

    // Cookie header: jar cookies first, then explicit request cookies.
    let mut cookie_parts: Vec<String> = Vec::new();
    if let Some(jar) = &inner.jar {
        if let Some(value) = jar.cookie_header_value(url) {
            cookie_parts.push(value);
        }
    }
    for cookie in cookies {
        cookie_parts.push(cookie.encoded());
    }
    if !cookie_parts.is_empty() {
        let combined = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{existing}; {}", cookie_parts.join("; ")),
            None => cookie_parts.join("; "),
        };
        headers.insert(COOKIE, HeaderValue::from_str(&combined).map_err(error::builder)?);
    }

    // Plain-http proxying carries credentials per request.
    if url.scheme() == "http" {
        if let Some(intercept) = inner.matcher.intercept(url) {
            if let Some(auth) = &intercept.basic_auth {
                headers.insert(PROXY_AUTHORIZATION, auth.clone());
            }
        }
    }

    Ok(headers)
}

/// One transport call under the attempt deadline, the caller's context
/// and a panic containment barrier.
async fn dispatch_once(
    inner: &ClientInner,
    request: Request<Full<Bytes>>,
    budget: Duration,
    ctx: Option<&CancellationToken>,
) -> Result<http::Response<Incoming>, Error> {
    let fut = inner.hyper.request(request);
    let contained = std::panic::AssertUnwindSafe(fut).catch_unwind();
    let limited = tokio::time::timeout(budget, contained);

    let joined = match ctx {
        Some(token) => tokio::select! {
            _ = token.cancelled() => return Err(error::canceled()),
            outcome = limited => outcome,
        },
        None => limited.await,
    };
    match joined {
        Err(_elapsed) => Err(error::timeout()),
        Ok(Err(panic)) => Err(error::panic_recovered(describe_panic(&panic))),
        Ok(Ok(Err(cause))) => Err(classify_dispatch(cause)),
        Ok(Ok(Ok(response))) => Ok(response),
    }
}

fn describe_panic(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

/// Map a transport failure onto the error taxonomy. Post-DNS SSRF
/// rejections ride the connector's error chain and take precedence.
fn classify_dispatch(cause: hyper_util::client::legacy::Error) -> Error {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&cause);
    while let Some(err) = source {
        if err.is::<SsrfViolation>() {
            return error::ssrf(cause.to_string());
        }
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            if io_err.get_ref().map(|inner| inner.is::<SsrfViolation>()) == Some(true) {
                return error::ssrf(cause.to_string());
            }
        }
        source = err.source();
    }
    if cause.is_connect() {
        error::connect(cause)
    } else {
        error::request(cause)
    }
}

fn is_followable_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Standard redirect semantics: 303 always becomes GET, 301/302 demote
/// POST to GET, 307/308 preserve method and body.
fn redirect_method(status: StatusCode, method: &Method) -> (Method, bool) {
    match status {
        StatusCode::SEE_OTHER if *method != Method::HEAD => (Method::GET, false),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if *method == Method::POST => {
            (Method::GET, false)
        }
        _ => (method.clone(), true),
    }
}

fn strip_userinfo(url: &Url) -> Url {
    if url.username().is_empty() && url.password().is_none() {
        return url.clone();
    }
    let mut clean = url.clone();
    let _ = clean.set_username("");
    let _ = clean.set_password(None);
    clean
}

fn content_length_of(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn check_content_length(
    headers: &HeaderMap,
    method: Method,
    status: StatusCode,
    transferred: u64,
) -> Result<(), Error> {
    // HEAD responses and bodiless statuses advertise lengths they never
    // send.
    if method == Method::HEAD
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
    {
        return Ok(());
    }
    if let Some(advertised) = content_length_of(headers) {
        if advertised != transferred {
            return Err(error::decode(format!(
                "body length {transferred} does not match Content-Length {advertised}"
            )));
        }
    }
    Ok(())
}

fn remaining_budget(timeout: Duration, attempt_started: Instant) -> Duration {
    timeout.saturating_sub(attempt_started.elapsed())
}

/// Run `fut` under the attempt budget and the caller's context.
async fn with_limits<T>(
    ctx: Option<&CancellationToken>,
    budget: Duration,
    fut: impl std::future::Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    let limited = tokio::time::timeout(budget, fut);
    match ctx {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(error::canceled()),
            outcome = limited => match outcome {
                Err(_elapsed) => Err(error::timeout()),
                Ok(inner) => inner,
            },
        },
        None => match limited.await {
            Err(_elapsed) => Err(error::timeout()),
            Ok(inner) => inner,
        },
    }
}

async fn backoff_sleep(delay: Duration, ctx: Option<&CancellationToken>) -> Result<(), Error> {
    match ctx {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(error::canceled()),
            () = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

/// Capture up to `limit` bytes, pre-sizing from the advertised length.
/// Exceeding the limit drains a bounded tail and fails.
async fn read_body(
    mut body: Incoming,
    limit: u64,
    size_hint: Option<u64>,
) -> Result<(Bytes, u64), Error> {
    let capacity = size_hint.unwrap_or(8 * 1024).min(limit) as usize;
    let mut collected = Vec::with_capacity(capacity);
    let mut transferred: u64 = 0;
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(error::request)?;
        if let Ok(data) = frame.into_data() {
            transferred += data.len() as u64;
            if transferred > limit {
                drain(body, DRAIN_ALLOWANCE).await;
                return Err(error::body_too_large(limit));
            }
            collected.extend_from_slice(&data);
        }
    }
    Ok((Bytes::from(collected), transferred))
}

/// Consume up to `allowance` further bytes so the connection can go back
/// to the pool; give up (dropping the connection) past that.
async fn drain(mut body: Incoming, allowance: u64) {
    let mut drained: u64 = 0;
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Ok(data) = frame.into_data() {
                    drained += data.len() as u64;
                    if drained > allowance {
                        return;
                    }
                }
            }
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_method_transforms() {
        let (method, keep) = redirect_method(StatusCode::SEE_OTHER, &Method::POST);
        assert_eq!(method, Method::GET);
        assert!(!keep);

        let (method, keep) = redirect_method(StatusCode::FOUND, &Method::POST);
        assert_eq!(method, Method::GET);
        assert!(!keep);

        let (method, keep) = redirect_method(StatusCode::TEMPORARY_REDIRECT, &Method::POST);
        assert_eq!(method, Method::POST);
        assert!(keep);

        let (method, keep) = redirect_method(StatusCode::FOUND, &Method::DELETE);
        assert_eq!(method, Method::DELETE);
        assert!(keep);

        let (method, _) = redirect_method(StatusCode::SEE_OTHER, &Method::HEAD);
        assert_eq!(method, Method::HEAD);
    }

    #[test]
    fn pre_dns_check_blocks_literals_and_localhost() {
        for raw in [
            "http://127.0.0.1/",
            "http://10.1.2.3:8080/x",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data/",
            "http://[::1]/",
            "http://localhost/",
            "http://app.localhost/",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(pre_dns_check(&url).unwrap_err().is_ssrf(), "{raw}");
        }
        let public = Url::parse("http://example.com/").unwrap();
        assert!(pre_dns_check(&public).is_ok());
    }

    #[test]
    fn userinfo_never_reaches_the_wire() {
        let url = Url::parse("http://user:pw@example.com/x").unwrap();
        let clean = strip_userinfo(&url);
        assert_eq!(clean.as_str(), "http://example.com/x");
    }

    #[test]
    fn content_length_check_rules() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "10".parse().unwrap());
        assert!(check_content_length(&headers, Method::GET, StatusCode::OK, 10).is_ok());
        assert!(check_content_length(&headers, Method::GET, StatusCode::OK, 7).is_err());
        assert!(check_content_length(&headers, Method::HEAD, StatusCode::OK, 0).is_ok());
        assert!(
            check_content_length(&headers, Method::GET, StatusCode::NOT_MODIFIED, 0).is_ok()
        );
        let empty = HeaderMap::new();
        assert!(check_content_length(&empty, Method::GET, StatusCode::OK, 3).is_ok());
    }
}
