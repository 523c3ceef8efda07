//! Minimal HTTP/1.1 client over a Unix domain socket.
//!
//! The Docker Engine speaks plain HTTP on its socket, so this module frames
//! requests and parses responses by hand instead of pulling in a full HTTP
//! stack.
//!
//! # Architecture
//!
//! - **`connection`**: owns the socket, writes a request and drives the read loop
//! - **`parser`**: parses the status line and headers from accumulated bytes
//! - **`chunked`**: reassembles `Transfer-Encoding: chunked` bodies
//! - **`request`**: request representation and the Engine request factory
//! - **`response`**: response representation and case-insensitive headers
//! - **`writer`**: serializes requests and writes them to the socket
//!
//! # Exchange
//!
//! ```text
//!        ┌─────────────┐
//!        │   Connect   │ ← one socket per request
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │    Write    │ ← `Connection: close` request
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │ Read head   │ ← until CRLFCRLF (timeout → Timeout)
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │ Read body   │ ← Content-Length / chunked / until close
//!        └──────┬──────┘
//!               ▼
//!            Response   (socket closed on drop)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bulkhead::http::connection::Connection;
//! use bulkhead::http::request::{Method, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut conn = Connection::connect("/var/run/docker.sock").await?;
//! conn.send(&Request::engine(Method::GET, "/v1.41/version", None)).await?;
//! let response = conn
//!     .read_response(Duration::from_secs(5), &CancellationToken::new())
//!     .await?;
//! ```

pub mod chunked;
pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
