//! Docker Engine API client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::docker::cache::EnrichmentCache;
use crate::docker::models::{
    Container, ContainerInspect, ExecCreateRequest, ExecCreated, ExecInspect, ExecStartRequest,
    Image, ImageInspection,
};
use crate::error::{DockerError, Result};
use crate::http::connection::Connection;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::stream::demux::{LogStream, decode_all};

/// Engine API version prefix for every path.
pub const API_VERSION: &str = "/v1.41";

/// Per-request read budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to the Engine over its Unix socket.
///
/// Every call opens its own connection. Clones share the enrichment cache.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
    timeout: Duration,
    cache: Arc<EnrichmentCache>,
    cancel: CancellationToken,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_TIMEOUT,
            cache: Arc::new(EnrichmentCache::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Builds a client for the configured socket, or fails with
    /// [`DockerError::NoExecutor`] when none is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.docker_host_path {
            Some(path) if !path.as_os_str().is_empty() => {
                Ok(Self::new(path).with_timeout(config.request_timeout))
            }
            _ => Err(DockerError::NoExecutor),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: Arc<EnrichmentCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Returns a client whose requests end with [`DockerError::Cancelled`]
    /// once `token` is cancelled. The cache stays shared.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn cache(&self) -> &Arc<EnrichmentCache> {
        &self.cache
    }

    /// Sends one request on a fresh connection and returns the full
    /// response, whatever its status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let request = Request::engine(method, path, body);

        let mut conn = Connection::connect(&self.socket_path).await?;
        conn.send(&request).await?;
        let response = conn.read_response(self.timeout, &self.cancel).await?;

        debug!(
            method = method.as_str(),
            path = %path,
            status = response.status,
            body_size = response.body.len(),
            "Engine request completed"
        );

        Ok(response)
    }

    /// Sends a request and returns the body of a non-error response.
    pub async fn make_request(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let response = self.send(method, path, body).await?.error_for_status()?;
        Ok(response.body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.make_request(path, Method::GET, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        info!("Listing containers");
        self.get_json(&format!("{API_VERSION}/containers/json?all=true"))
            .await
    }

    pub async fn list_images(&self) -> Result<Vec<Image>> {
        info!("Listing images");
        self.get_json(&format!("{API_VERSION}/images/json")).await
    }

    pub async fn start_container(&self, id: &str) -> Result<()> {
        info!(container = %id, "Starting container");
        self.make_request(
            &format!("{API_VERSION}/containers/{id}/start"),
            Method::POST,
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn stop_container(&self, id: &str) -> Result<()> {
        info!(container = %id, "Stopping container");
        self.make_request(
            &format!("{API_VERSION}/containers/{id}/stop"),
            Method::POST,
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn inspect_container_raw(&self, id: &str) -> Result<Vec<u8>> {
        self.make_request(
            &format!("{API_VERSION}/containers/{id}/json"),
            Method::GET,
            None,
        )
        .await
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        let body = self.inspect_container_raw(id).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn inspect_image(&self, id: &str) -> Result<ImageInspection> {
        info!(image = %id, "Inspecting image");
        self.get_json(&format!("{API_VERSION}/images/{id}/json"))
            .await
    }

    pub async fn is_tty_enabled(&self, id: &str) -> Result<bool> {
        Ok(self.inspect_container(id).await?.is_tty())
    }

    /// Raw log bytes: the last `tail` lines of stdout and stderr.
    pub async fn container_logs(&self, id: &str, tail: usize) -> Result<Vec<u8>> {
        info!(container = %id, tail, "Fetching container logs");
        self.make_request(
            &format!(
                "{API_VERSION}/containers/{id}/logs?stdout=true&stderr=true&tail={tail}&follow=false"
            ),
            Method::GET,
            None,
        )
        .await
    }

    /// Adds inspect detail to `container`, reusing a cached result while it
    /// is fresh.
    pub async fn enrich_container(&self, container: &Container) -> Result<Container> {
        if let Some(cached) = self.cache.get(&container.id).await {
            debug!(container = %container.id, "Enrichment cache hit");
            return Ok(cached);
        }

        let detail = self.inspect_container_raw(&container.id).await?;
        let enriched = container.enrich(&detail)?;
        self.cache.insert(enriched.clone()).await;

        Ok(enriched)
    }

    /// Runs `command` in a running container and returns its stdout.
    ///
    /// Steps: inspect (must be running), create the exec instance, start it
    /// attached, demultiplex the output, then check the exit code. Stderr
    /// is discarded.
    pub async fn exec(
        &self,
        container_id: &str,
        command: &[String],
        add_carriage_return: bool,
    ) -> Result<Vec<u8>> {
        let inspect = self.inspect_container(container_id).await?;
        if !inspect.is_running() {
            return Err(DockerError::ContainerNotRunning);
        }

        info!(container = %container_id, command = ?command, "Creating exec instance");
        let create_body = serde_json::to_vec(&ExecCreateRequest {
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            cmd: command,
        })?;
        let created = self
            .make_request(
                &format!("{API_VERSION}/containers/{container_id}/exec"),
                Method::POST,
                Some(create_body),
            )
            .await?;
        let ExecCreated { id: exec_id } = serde_json::from_slice(&created)?;
        if exec_id.is_empty() {
            return Err(DockerError::InvalidResponse(
                "exec create response carried an empty Id".to_string(),
            ));
        }

        let start_body = serde_json::to_vec(&ExecStartRequest {
            detach: false,
            tty: false,
        })?;
        let raw = self
            .make_request(
                &format!("{API_VERSION}/exec/{exec_id}/start"),
                Method::POST,
                Some(start_body),
            )
            .await?;

        let output: Vec<u8> = decode_all(&raw, add_carriage_return)
            .into_iter()
            .filter(|line| line.stream == LogStream::Stdout)
            .flat_map(|line| line.message)
            .collect();

        let status: ExecInspect = self
            .get_json(&format!("{API_VERSION}/exec/{exec_id}/json"))
            .await?;
        match status.exit_code {
            Some(0) => Ok(output),
            Some(code) => Err(DockerError::ExecFailed(code)),
            None => Err(DockerError::InvalidResponse(
                "exec instance reported no exit code".to_string(),
            )),
        }
    }
}
