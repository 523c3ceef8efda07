//! Engine API records.
//!
//! Field names follow the Engine API v1.41 JSON schema. Everything the
//! Engine may omit or send as `null` is optional.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Containers
// ============================================================================

/// A container from `GET /containers/json`, optionally enriched with
/// fields from its inspect document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    pub image: String,
    pub status: String,
    /// Machine-readable state from the listing (`running`, `exited`, ...).
    #[serde(default)]
    pub state: Option<String>,

    // Populated by enrichment only.
    #[serde(skip_deserializing)]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub command: Option<String>,
    #[serde(skip_deserializing)]
    pub ports: Vec<PortBinding>,
    #[serde(skip_deserializing)]
    pub mounts: Vec<MountInfo>,
    #[serde(skip_deserializing)]
    pub env: Vec<String>,
    #[serde(skip_deserializing)]
    pub health: Option<String>,
}

impl Container {
    /// First name without the leading slash, or the id.
    pub fn title(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or(&self.id)
    }

    /// Lifecycle state from the listing's `State` field, else guessed
    /// from the human-readable status text.
    pub fn container_state(&self) -> ContainerState {
        if let Some(state) = self.state.as_deref().and_then(ContainerState::from_name) {
            return state;
        }

        let status = self.status.to_lowercase();
        if status.contains("paused") {
            ContainerState::Paused
        } else if status.contains("restarting") {
            ContainerState::Restarting
        } else if status.contains("removing") {
            ContainerState::Removing
        } else if status.contains("up") {
            ContainerState::Running
        } else if status.contains("dead") {
            ContainerState::Dead
        } else if status.contains("created") {
            ContainerState::Created
        } else {
            ContainerState::Exited
        }
    }

    pub fn health_status(&self) -> HealthStatus {
        match self.health.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("none") => HealthStatus::None,
            Some("healthy") => HealthStatus::Healthy,
            Some("unhealthy") => HealthStatus::Unhealthy,
            Some("starting") => HealthStatus::Starting,
            Some(_) => HealthStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerState {
    /// Parses the Engine's state name, e.g. `running`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "created" => Some(ContainerState::Created),
            "running" => Some(ContainerState::Running),
            "paused" => Some(ContainerState::Paused),
            "restarting" => Some(ContainerState::Restarting),
            "removing" => Some(ContainerState::Removing),
            "exited" => Some(ContainerState::Exited),
            "dead" => Some(ContainerState::Dead),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Starting,
    None,
    Unknown,
}

/// A published port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    pub private_port: u16,
    pub public_port: Option<u16>,
    #[serde(rename = "Type")]
    pub port_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountInfo {
    pub source: String,
    pub destination: String,
    #[serde(rename = "Type")]
    pub mount_type: String,
}

/// `GET /containers/{id}/json`, reduced to the fields this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    #[serde(default)]
    pub id: String,
    pub created: Option<String>,
    pub config: Option<ContainerConfig>,
    pub state: Option<ContainerStateInfo>,
    pub mounts: Option<Vec<InspectMount>>,
    pub network_settings: Option<NetworkSettings>,
}

impl ContainerInspect {
    pub fn is_running(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.running)
    }

    pub fn is_tty(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.tty)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub tty: bool,
    pub cmd: Option<Vec<String>>,
    pub env: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerStateInfo {
    #[serde(default)]
    pub running: bool,
    pub status: Option<String>,
    pub exit_code: Option<i64>,
    pub health: Option<HealthInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthInfo {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectMount {
    pub source: Option<String>,
    pub destination: Option<String>,
    #[serde(rename = "Type")]
    pub mount_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    /// `"<port>/<proto>"` to host bindings; `null` for exposed but
    /// unpublished ports.
    pub ports: Option<HashMap<String, Option<Vec<HostBinding>>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
}

// ============================================================================
// Images
// ============================================================================

/// An image from `GET /images/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    pub id: String,
    pub repo_tags: Option<Vec<String>>,
    pub created: i64,
    pub size: i64,
}

impl Image {
    pub fn title(&self) -> &str {
        self.repo_tags
            .as_ref()
            .and_then(|tags| tags.first())
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// `GET /images/{id}/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspection {
    pub id: String,
    pub parent: Option<String>,
    pub repo_tags: Option<Vec<String>>,
    pub repo_digests: Option<Vec<String>>,
    pub created: String,
    pub size: i64,
    pub virtual_size: Option<i64>,
    pub labels: Option<HashMap<String, String>>,
    pub config: Option<ImageConfig>,
}

impl ImageInspection {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageConfig {
    pub entrypoint: Option<Vec<String>>,
    pub cmd: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
    pub volumes: Option<HashMap<String, HashMap<String, String>>>,
    pub exposed_ports: Option<HashMap<String, HashMap<String, String>>>,
}

// ============================================================================
// Exec
// ============================================================================

/// Body of `POST /containers/{id}/exec`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecCreateRequest<'a> {
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub cmd: &'a [String],
}

/// Body of `POST /exec/{id}/start`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecStartRequest {
    pub detach: bool,
    pub tty: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecCreated {
    pub id: String,
}

/// `GET /exec/{id}/json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecInspect {
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub running: bool,
}

/// Parses Engine timestamps such as `2024-01-02T03:04:05.123456789Z`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
