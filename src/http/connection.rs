use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::DockerError;
use crate::http::chunked::{ChunkedError, decode_chunked};
use crate::http::parser::{BodyKind, ParseError, ResponseHead, parse_response_head};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::RequestWriter;

/// Size of each socket read.
pub const READ_CHUNK: usize = 4096;

/// Pause before retrying a read that reported would-block.
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// One request/response exchange over the Engine's Unix socket.
///
/// The socket is closed when the connection is dropped; connections are
/// never reused.
pub struct Connection {
    stream: UnixStream,
    path: PathBuf,
    buffer: BytesMut,
    state: ReadState,
}

/// Progress of [`Connection::read_response`].
///
/// ```text
///   AwaitingHead ──CRLFCRLF──▶ AwaitingBody ──body complete──▶ done
///        │                          │
///        └──── close / timeout ─────┴──▶ finish with what arrived
/// ```
enum ReadState {
    AwaitingHead,
    AwaitingBody(ResponseHead, BodyKind),
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Complete,
    PeerClosed,
    TimedOut,
}

impl Connection {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DockerError> {
        let path = path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|source| DockerError::ConnectionFailed {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "Connected to Docker socket");

        Ok(Self {
            stream,
            path,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ReadState::AwaitingHead,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every byte or fails with [`DockerError::SocketWrite`].
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), DockerError> {
        RequestWriter::from_bytes(bytes.to_vec())
            .write_to_stream(&mut self.stream)
            .await
    }

    pub async fn send(&mut self, request: &Request) -> Result<(), DockerError> {
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            "Sending request"
        );
        RequestWriter::new(request)
            .write_to_stream(&mut self.stream)
            .await
    }

    /// Reads one response.
    ///
    /// Stops once the head and a complete body have arrived, when the peer
    /// closes, when `timeout` elapses, or when `cancel` fires.
    pub async fn read_response(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Response, DockerError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK];

        let stop = loop {
            if self.advance()? {
                break Stop::Complete;
            }

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DockerError::Cancelled),
                res = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)) => res,
            };

            match read {
                Err(_elapsed) => break Stop::TimedOut,
                Ok(Ok(0)) => {
                    debug!("Connection closed by peer");
                    break Stop::PeerClosed;
                }
                Ok(Ok(n)) => self.buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) =>
                {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Ok(Err(e)) => return Err(DockerError::SocketRead(e)),
            }
        };

        // Pick up a head that arrived in the final read.
        if stop != Stop::Complete {
            self.advance()?;
        }

        let ReadState::AwaitingBody(head, kind) =
            std::mem::replace(&mut self.state, ReadState::AwaitingHead)
        else {
            return Err(match stop {
                Stop::TimedOut => DockerError::Timeout(timeout),
                _ => DockerError::InvalidResponse(
                    "connection closed before complete HTTP headers were received".to_string(),
                ),
            });
        };

        debug!(
            status = head.status,
            raw_size = self.buffer.len(),
            "Received response headers"
        );

        let body = finish_body(&self.buffer[head.header_len..], kind, stop, timeout)?;

        debug!(body_size = body.len(), "Final body size");

        Ok(Response {
            status_line: head.status_line,
            status: head.status,
            reason: head.reason,
            headers: head.headers,
            body,
        })
    }

    /// Parses the head once it is available and reports whether the body
    /// is complete.
    fn advance(&mut self) -> Result<bool, DockerError> {
        if let ReadState::AwaitingHead = self.state {
            match parse_response_head(&self.buffer) {
                Ok(head) => {
                    let kind = head.body_kind()?;
                    self.state = ReadState::AwaitingBody(head, kind);
                }
                Err(ParseError::Incomplete) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }

        let ReadState::AwaitingBody(head, kind) = &self.state else {
            return Ok(false);
        };
        let body = &self.buffer[head.header_len..];

        Ok(match kind {
            BodyKind::Length(n) => body.len() >= *n,
            BodyKind::Chunked => {
                body.ends_with(b"\r\n")
                    && !matches!(decode_chunked(body), Err(ChunkedError::Incomplete))
            }
            BodyKind::UntilClose => false,
        })
    }
}

fn finish_body(
    body: &[u8],
    kind: BodyKind,
    stop: Stop,
    timeout: Duration,
) -> Result<Vec<u8>, DockerError> {
    match kind {
        BodyKind::Chunked => {
            debug!("Dechunking body");
            let (decoded, _) = decode_chunked(body).map_err(|e| match (e, stop) {
                (ChunkedError::Incomplete, Stop::TimedOut) => DockerError::Timeout(timeout),
                (e, _) => DockerError::Chunked(e),
            })?;
            Ok(decoded)
        }
        BodyKind::Length(expected) if body.len() < expected => Err(DockerError::IncompleteBody {
            expected,
            received: body.len(),
        }),
        BodyKind::Length(expected) => {
            if body.len() > expected {
                warn!(
                    received = body.len(),
                    content_length = expected,
                    "Received body longer than Content-Length, truncating"
                );
            }
            Ok(body[..expected].to_vec())
        }
        BodyKind::UntilClose if stop == Stop::TimedOut => Err(DockerError::Timeout(timeout)),
        BodyKind::UntilClose => Ok(body.to_vec()),
    }
}
