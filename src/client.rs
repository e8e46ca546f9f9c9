//! Verification client.
//!
//! Sends a point set to the hull server, computes the same hull locally and
//! compares the two encodings byte for byte. A mismatch is a finding, not a
//! failure: it points at a protocol bug or at nondeterminism in one of the
//! two evaluations.

use crate::codec::{self, ParseError};
use crate::config::ClientConfig;
use crate::geometry::{self, Point, MIN_HULL_POINTS};
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Client-side errors
#[derive(Debug)]
pub enum ClientError {
    /// Connect, send or receive failed
    Transport(io::Error),
    /// No complete response within the receive timeout
    Timeout,
    /// Input rejected before anything was sent
    Parse(ParseError),
    /// Server answered with an `ERROR` line
    Remote(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
            ClientError::Timeout => write!(f, "Timed out waiting for the server"),
            ClientError::Parse(e) => write!(f, "Invalid input: {}", e),
            ClientError::Remote(msg) => write!(f, "Server rejected request: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<io::Error> for ClientError {
    fn from(e: io::Error) -> Self {
        ClientError::Transport(e)
    }
}

impl From<ParseError> for ClientError {
    fn from(e: ParseError) -> Self {
        ClientError::Parse(e)
    }
}

/// Outcome of comparing the local hull with the server's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub local: String,
    pub remote: String,
}

impl Verification {
    pub fn matched(&self) -> bool {
        self.local == self.remote
    }
}

/// Parse one line of user input, requiring enough points for a hull.
pub fn parse_input(line: &str) -> Result<Vec<Point>, ParseError> {
    codec::decode_request(line, MIN_HULL_POINTS)
}

pub struct HullClient {
    config: ClientConfig,
}

impl HullClient {
    pub fn new(config: ClientConfig) -> Self {
        HullClient { config }
    }

    /// Send `points` and return the server's encoded hull.
    pub async fn request(&self, points: &[Point]) -> Result<String, ClientError> {
        self.send_raw(codec::encode(points).as_bytes()).await
    }

    /// Send raw request bytes and return the response text.
    pub async fn send_raw(&self, request: &[u8]) -> Result<String, ClientError> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.config.server).await?;
            trace!(server = %self.config.server, bytes = request.len(), "Sending request");

            stream.write_all(request).await?;
            stream.shutdown().await?;
            read_to_end(&mut stream, self.config.buffer_size).await
        };

        let response = tokio::time::timeout(self.config.timeout(), exchange)
            .await
            .map_err(|_| ClientError::Timeout)??;

        match response.strip_prefix(codec::ERROR_PREFIX) {
            Some(msg) => Err(ClientError::Remote(msg.trim_end().to_string())),
            None => Ok(response),
        }
    }

    /// Compute the hull locally, ask the server for it and compare.
    pub async fn verify(&self, points: &[Point]) -> Result<Verification, ClientError> {
        let local = codec::encode(&geometry::jarvis_hull(points));
        self.compare(points, local).await
    }

    /// Compare an already encoded local hull with the server's answer.
    pub async fn compare(&self, points: &[Point], local: String) -> Result<Verification, ClientError> {
        let remote = self.request(points).await?;
        let verification = Verification { local, remote };

        if verification.matched() {
            debug!(hull = %verification.local, "Server hull matches local hull");
        } else {
            warn!(
                local = %verification.local,
                remote = %verification.remote,
                "Server hull differs from local hull"
            );
        }
        Ok(verification)
    }
}

/// Read until the server closes, `chunk` bytes at a time.
async fn read_to_end<R: AsyncRead + Unpin>(stream: &mut R, chunk: usize) -> io::Result<String> {
    let mut buffer = BytesMut::with_capacity(chunk);
    loop {
        buffer.reserve(chunk);
        if stream.read_buf(&mut buffer).await? == 0 {
            break;
        }
    }
    String::from_utf8(buffer.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
