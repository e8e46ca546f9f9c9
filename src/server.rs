//! TCP server for computing convex hulls.
//!
//! Every connection carries exactly one request. The server performs a
//! single bounded read, decodes the points, computes the hull, writes the
//! encoded hull back and closes the connection. There is no keep-alive and
//! no session state.
//!
//! By default connections are served one at a time, in accept order, with
//! no read timeout: a stalled client holds up the whole server. Setting
//! `concurrent` or `read_timeout_ms` in [`ServerConfig`] lifts either
//! restriction.

use crate::codec;
use crate::config::ServerConfig;
use crate::geometry;
use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, trace, warn};

/// Lifecycle of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Accepted,
    Reading,
    Computing,
    Responding,
    Closed,
}

/// Server instance
pub struct Server {
    config: Arc<ServerConfig>,
    listener: TcpListener,
}

impl Server {
    /// Bind the listening socket. Failure here is fatal for the caller.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let addr = tokio::net::lookup_host(&config.listen)
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no address for '{}'", config.listen),
                )
            })?;

        let listener = TcpListener::from_std(create_listener(addr, config.backlog)?)?;
        debug!(address = %addr, backlog = config.backlog, "Listener created");

        Ok(Server {
            config: Arc::new(config),
            listener,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process is terminated.
    pub async fn run(self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "New connection");

                    if self.config.concurrent {
                        let config = Arc::clone(&self.config);
                        tokio::spawn(async move {
                            serve_connection(stream, peer, &config).await;
                        });
                    } else {
                        serve_connection(stream, peer, &self.config).await;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}

/// Per-connection failures are logged and never stop the accept loop.
async fn serve_connection(stream: TcpStream, peer: SocketAddr, config: &ServerConfig) {
    let mut conn = Connection::new(peer);
    if let Err(e) = conn.handle(stream, config).await {
        warn!(peer = %peer, state = ?conn.state, error = %e, "Connection error");
    }
    conn.enter(ConnState::Closed);
}

struct Connection {
    peer: SocketAddr,
    state: ConnState,
}

impl Connection {
    fn new(peer: SocketAddr) -> Self {
        Connection {
            peer,
            state: ConnState::Accepted,
        }
    }

    fn enter(&mut self, next: ConnState) {
        trace!(peer = %self.peer, from = ?self.state, to = ?next, "Connection state");
        self.state = next;
    }

    async fn handle(&mut self, mut stream: TcpStream, config: &ServerConfig) -> io::Result<()> {
        self.enter(ConnState::Reading);

        // One bounded read. The extra byte tells an oversized request apart
        // from one that exactly fills the buffer.
        let mut buffer = BytesMut::zeroed(config.buffer_size + 1);
        let n = match config.read_timeout() {
            Some(limit) => tokio::time::timeout(limit, stream.read(&mut buffer))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timed out"))??,
            None => stream.read(&mut buffer).await?,
        };
        if n == 0 {
            trace!(peer = %self.peer, "Connection closed by client");
            return Ok(());
        }
        buffer.truncate(n);

        self.enter(ConnState::Computing);
        let response = respond_bounded(&buffer, config.buffer_size, config.policy);

        self.enter(ConnState::Responding);
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Build the response for a request read into a buffer of `limit` bytes.
///
/// A request longer than `limit` may end in a cut-off number. The strict
/// policy rejects it; the lenient policy decodes the first `limit` bytes.
pub fn respond_bounded(request: &[u8], limit: usize, policy: codec::ParsePolicy) -> String {
    if request.len() <= limit {
        return respond(request, policy);
    }

    match policy {
        codec::ParsePolicy::Strict => {
            let err = codec::ParseError::RequestTooLarge { limit };
            warn!(error = %err, "Rejecting oversized request");
            codec::encode_error(&err)
        }
        codec::ParsePolicy::Lenient => respond(&request[..limit], policy),
    }
}

/// Build the response for one request.
///
/// A hull of fewer than three points encodes to the empty string. Under the
/// strict policy a malformed request produces an `ERROR` line instead.
pub fn respond(request: &[u8], policy: codec::ParsePolicy) -> String {
    match codec::decode_with_policy(request, policy) {
        Ok(points) => {
            let hull = geometry::jarvis_hull(&points);
            debug!(points = points.len(), hull = hull.len(), "Computed hull");
            codec::encode(&hull)
        }
        Err(e) => {
            warn!(error = %e, "Rejecting malformed request");
            codec::encode_error(&e)
        }
    }
}
