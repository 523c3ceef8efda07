//! Error taxonomy for the Engine transport and client.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::http::chunked::ChunkedError;
use crate::http::parser::ParseError;

/// Result type alias for Engine operations.
pub type Result<T> = std::result::Result<T, DockerError>;

#[derive(Debug, Error)]
pub enum DockerError {
    /// No socket path is configured, so no client can be built.
    #[error("no Docker socket path is configured")]
    NoExecutor,

    #[error("the container is not running")]
    ContainerNotRunning,

    #[error("failed to connect to Docker socket {}: {source}", path.display())]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading from Docker socket: {0}")]
    SocketRead(#[source] std::io::Error),

    #[error("error writing to Docker socket: {0}")]
    SocketWrite(#[source] std::io::Error),

    #[error("timed out after {0:?} waiting for the Docker daemon")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response from Docker API: {0}")]
    InvalidResponse(String),

    #[error("malformed HTTP response: {0}")]
    Parse(#[from] ParseError),

    #[error("malformed chunked body: {0}")]
    Chunked(#[from] ChunkedError),

    #[error("incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    #[error("Docker API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode Docker API JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command exited with code {0}")]
    ExecFailed(i64),
}

impl DockerError {
    /// Errors that mean the daemon is unreachable rather than that one
    /// operation failed. Front ends show these globally.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DockerError::NoExecutor
                | DockerError::ConnectionFailed { .. }
                | DockerError::SocketRead(_)
                | DockerError::SocketWrite(_)
                | DockerError::Timeout(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DockerError::NoExecutor | DockerError::ConnectionFailed { .. } => {
                "Check the Docker socket path and make sure Docker (or Colima/Rancher Desktop) is running."
            }
            DockerError::ContainerNotRunning => {
                "Start the container before running this operation."
            }
            DockerError::SocketRead(_)
            | DockerError::SocketWrite(_)
            | DockerError::Timeout(_)
            | DockerError::Api { .. } => {
                "Make sure the Docker daemon is running and responsive; restarting Docker may help."
            }
            DockerError::Cancelled => "The request was cancelled before it completed.",
            DockerError::InvalidResponse(_)
            | DockerError::Parse(_)
            | DockerError::Chunked(_)
            | DockerError::IncompleteBody { .. }
            | DockerError::Json(_) => {
                "Docker sent an unexpected response. If this keeps happening, please report it."
            }
            DockerError::ExecFailed(_) => {
                "Check the command and the container's logs for details."
            }
        }
    }
}
