//! Connection establishment
//!
//! [`Connector`] is the `tower_service::Service<Uri>` handed to the
//! hyper-util pool. Each call runs the full chain for one origin:
//! guarded DNS → TCP dial (with timeout, nodelay, keep-alive) → optional
//! proxy CONNECT tunnel → optional rustls handshake with ALPN. The
//! returned [`Conn`] tells the pool whether `h2` was negotiated and
//! whether requests must use absolute-form (plain HTTP via proxy).

pub(crate) mod tls;

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::HttpConfig;
use crate::dns::{DynResolver, GuardedResolver, Name};
use crate::error::{BoxError, Error, SsrfViolation, TimedOut};
use crate::proxy::Matcher;
use crate::validation::ip::is_blocked_ip;

/// Builds connections for the pool. Cheap to clone; state is shared.
#[derive(Clone)]
pub(crate) struct Connector {
    inner: Arc<ConnectorInner>,
}

struct ConnectorInner {
    resolver: GuardedResolver,
    proxy_resolver: DynResolver,
    tls: Arc<rustls::ClientConfig>,
    matcher: Arc<Matcher>,
    block_private: bool,
    connect_timeout: Duration,
    tls_timeout: Duration,
    keep_alive: Option<Duration>,
}

impl Connector {
    pub(crate) fn new(
        config: &HttpConfig,
        matcher: Arc<Matcher>,
        resolver: DynResolver,
    ) -> Result<Connector, Error> {
        let block_private = !config.security.allow_private_ips;
        let tls_config = tls::build_client_config(&config.tls, config.protocol.enable_http2)?;
        Ok(Connector {
            inner: Arc::new(ConnectorInner {
                resolver: GuardedResolver::new(resolver.clone(), block_private),
                proxy_resolver: resolver,
                tls: Arc::new(tls_config),
                matcher,
                block_private,
                connect_timeout: config.timeouts.connect,
                tls_timeout: config.timeouts.tls_handshake,
                keep_alive: Some(config.timeouts.keep_alive).filter(|d| !d.is_zero()),
            }),
        })
    }
}

impl tower_service::Service<Uri> for Connector {
    type Response = Conn;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Conn, BoxError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.connect(dst).await })
    }
}

impl ConnectorInner {
    async fn connect(&self, dst: Uri) -> Result<Conn, BoxError> {
        let scheme = dst.scheme_str().unwrap_or("http");
        let is_https = scheme == "https";
        let host = dst
            .host()
            .ok_or_else(|| io_other("destination uri has no host"))?
            .trim_matches(['[', ']'])
            .to_owned();
        let port = dst
            .port_u16()
            .unwrap_or(if is_https { 443 } else { 80 });

        let intercept = self.matcher.intercept_parts(scheme, &host).cloned();

        let stream = match &intercept {
            Some(proxy) => {
                let proxy_host = proxy
                    .uri
                    .host()
                    .ok_or_else(|| io_other("proxy uri has no host"))?
                    .trim_matches(['[', ']'])
                    .to_owned();
                let proxy_port = proxy.uri.port_u16().unwrap_or(80);
                let addrs = self
                    .resolve_unguarded(proxy_host, proxy_port)
                    .await?;
                let mut stream = self.tcp_connect(addrs).await?;
                if is_https {
                    tunnel(
                        &mut stream,
                        &host,
                        port,
                        proxy.basic_auth.as_ref().and_then(|v| v.to_str().ok()),
                    )
                    .await?;
                }
                stream
            }
            None => {
                let addrs = self.resolve_destination(&host, port).await?;
                self.tcp_connect(addrs).await?
            }
        };

        if is_https {
            let server_name =
                ServerName::try_from(host.clone()).map_err(|e| io_other(e.to_string()))?;
            let connector = TlsConnector::from(Arc::clone(&self.tls));
            let handshake = connector.connect(server_name, stream);
            let tls_stream = tokio::time::timeout(self.tls_timeout, handshake)
                .await
                .map_err(|_| timed_out())??;
            let is_h2 = {
                let (_, session) = tls_stream.get_ref();
                session.alpn_protocol() == Some(&b"h2"[..])
            };
            tracing::trace!(host = %host, h2 = is_h2, "tls handshake complete");
            Ok(Conn {
                io: TokioIo::new(MaybeHttpsStream::Https(Box::new(tls_stream))),
                is_h2,
                is_proxy: false,
            })
        } else {
            Ok(Conn {
                io: TokioIo::new(MaybeHttpsStream::Http(stream)),
                is_h2: false,
                is_proxy: intercept.is_some(),
            })
        }
    }

    /// Resolve the destination host with the SSRF policy applied: literal
    /// IPs are checked directly, names go through the guarded resolver.
    async fn resolve_destination(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Vec<SocketAddr>, BoxError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            if self.block_private && is_blocked_ip(ip) {
                return Err(Box::new(io::Error::other(SsrfViolation { addr: ip })));
            }
            return Ok(vec![SocketAddr::new(ip, port)]);
        }
        self.resolver
            .resolve(Name {
                host: host.to_owned(),
                port,
            })
            .await
    }

    /// Proxy endpoints are operator-configured, not caller-supplied, so
    /// they bypass the private-range policy.
    async fn resolve_unguarded(
        &self,
        host: String,
        port: u16,
    ) -> Result<Vec<SocketAddr>, BoxError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }
        self.proxy_resolver.resolve(Name { host, port }).await
    }

    async fn tcp_connect(&self, addrs: Vec<SocketAddr>) -> Result<TcpStream, BoxError> {
        let mut last_err: Option<io::Error> = None;
        for addr in addrs {
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true).ok();
                    if let Some(interval) = self.keep_alive {
                        let sock = socket2::SockRef::from(&stream);
                        let keepalive = socket2::TcpKeepalive::new().with_time(interval);
                        sock.set_tcp_keepalive(&keepalive).ok();
                    }
                    return Ok(stream);
                }
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => last_err = Some(timed_out()),
            }
        }
        Err(Box::new(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no addresses to connect to")
        })))
    }
}

/// HTTP CONNECT handshake over an established proxy stream.
async fn tunnel<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    host: &str,
    port: u16,
    basic_auth: Option<&str>,
) -> Result<(), BoxError> {
    let mut request = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n");
    if let Some(auth) = basic_auth {
        request.push_str("Proxy-Authorization: ");
        request.push_str(auth);
        request.push_str("\r\n");
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = [0u8; 8192];
    let mut filled = 0;
    loop {
        let n = stream.read(&mut response[filled..]).await?;
        if n == 0 {
            return Err(Box::new(io_other("proxy closed connection during CONNECT")));
        }
        filled += n;
        if response[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if filled == response.len() {
            return Err(Box::new(io_other("proxy CONNECT response too large")));
        }
    }
    let head = String::from_utf8_lossy(&response[..filled]);
    let status_ok = head
        .lines()
        .next()
        .map(|line| line.contains(" 200"))
        .unwrap_or(false);
    if status_ok {
        Ok(())
    } else {
        Err(Box::new(io_other(format!(
            "proxy CONNECT refused: {}",
            head.lines().next().unwrap_or("")
        ))))
    }
}

fn io_other(message: impl Into<String>) -> io::Error {
    io::Error::other(message.into())
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, TimedOut)
}

/// A plain or TLS-wrapped stream.
enum MaybeHttpsStream {
    Http(TcpStream),
    Https(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for MaybeHttpsStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(s) => Pin::new(s).poll_read(cx, buf),
            MaybeHttpsStream::Https(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeHttpsStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            MaybeHttpsStream::Http(s) => Pin::new(s).poll_write(cx, buf),
            MaybeHttpsStream::Https(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(s) => Pin::new(s).poll_flush(cx),
            MaybeHttpsStream::Https(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(s) => Pin::new(s).poll_shutdown(cx),
            MaybeHttpsStream::Https(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// An established connection handed to the pool.
pub(crate) struct Conn {
    io: TokioIo<MaybeHttpsStream>,
    is_h2: bool,
    is_proxy: bool,
}

impl hyper::rt::Read for Conn {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: hyper::rt::ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl hyper::rt::Write for Conn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}

impl Connection for Conn {
    fn connected(&self) -> Connected {
        let mut connected = Connected::new();
        if self.is_h2 {
            connected = connected.negotiated_h2();
        }
        if self.is_proxy {
            connected = connected.proxy(true);
        }
        connected
    }
}
