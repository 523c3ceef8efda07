//! Bulkhead - Docker Engine client
//!
//! Core library: HTTP over the Engine's Unix socket, Engine API calls and
//! decoding of multiplexed log/exec streams.

pub mod config;
pub mod docker;
pub mod error;
pub mod http;
pub mod stream;

pub use error::{DockerError, Result};
