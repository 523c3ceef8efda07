//! Docker Engine API operations built on the [`crate::http`] transport.
//!
//! - **`client`**: one method per Engine endpoint, plus exec and enrichment
//! - **`models`**: typed records for the Engine's JSON
//! - **`enrich`**: merging inspect detail into listed containers
//! - **`cache`**: time-limited cache of enriched containers
//! - **`logs`**: log retrieval with TTY-aware line decoding
//! - **`detect`**: finding the socket of Docker Desktop, Colima or Rancher Desktop
//! - **`refresh`**: periodic list refresh

pub mod cache;
pub mod client;
pub mod detect;
pub mod enrich;
pub mod logs;
pub mod models;
pub mod refresh;

pub use cache::EnrichmentCache;
pub use client::DockerClient;
pub use logs::LogFetcher;
pub use models::{Container, Image, ImageInspection, MountInfo, PortBinding};
pub use refresh::{AutoRefresh, Snapshot};
