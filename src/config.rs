use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::docker::client::DEFAULT_TIMEOUT;
use crate::docker::detect::detect_docker_host_path;

/// Refresh interval used when none, or an unusable one, is stored.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// User preferences as persisted on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_host_path: Option<String>,
    /// Seconds between list refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<f64>,
}

impl Preferences {
    /// Reads preferences; a missing or empty file yields the defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading preferences from {}", path.display()))?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing preferences in {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_yaml::to_string(self).context("serializing preferences")?;
        std::fs::write(path, text)
            .with_context(|| format!("writing preferences to {}", path.display()))
    }
}

/// Where the effective socket path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketSource {
    DockerHost,
    Preferences,
    Detected,
    None,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Engine socket; `None` when nothing is configured or detected.
    pub docker_host_path: Option<PathBuf>,
    pub socket_source: SocketSource,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    /// Where [`Config::save`] writes.
    pub preferences_path: PathBuf,
    /// Preferences as stored, without environment or detected values.
    stored: Preferences,
}

impl Config {
    /// Loads preferences and resolves the socket from `DOCKER_HOST`, the
    /// stored path, or auto-detection, in that order.
    pub fn load() -> anyhow::Result<Self> {
        let preferences_path = preferences_path()?;
        let prefs = Preferences::load_from(&preferences_path)?;
        let docker_host = std::env::var("DOCKER_HOST").ok();

        Ok(Self::resolve(
            prefs,
            docker_host.as_deref(),
            preferences_path,
            detect_docker_host_path,
        ))
    }

    pub fn resolve(
        prefs: Preferences,
        docker_host: Option<&str>,
        preferences_path: PathBuf,
        detect: impl FnOnce() -> Option<PathBuf>,
    ) -> Self {
        let (docker_host_path, socket_source) =
            match docker_host.and_then(socket_path_from_docker_host) {
                Some(path) => (Some(path), SocketSource::DockerHost),
                None => match stored_socket(&prefs) {
                    Some(path) => (Some(path), SocketSource::Preferences),
                    None => match detect() {
                        Some(path) => (Some(path), SocketSource::Detected),
                        None => (None, SocketSource::None),
                    },
                },
            };

        let refresh_interval = prefs
            .refresh_interval
            .and_then(interval_from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);

        Self {
            docker_host_path,
            socket_source,
            refresh_interval,
            request_timeout: DEFAULT_TIMEOUT,
            preferences_path,
            stored: prefs,
        }
    }

    /// The preferences [`Config::save`] writes.
    pub fn preferences(&self) -> &Preferences {
        &self.stored
    }

    /// Stores `path` as the preferred socket. It takes effect now unless
    /// `DOCKER_HOST` overrides it.
    pub fn set_docker_host_path(&mut self, path: PathBuf) {
        self.stored.docker_host_path = Some(path.to_string_lossy().into_owned());
        if self.socket_source != SocketSource::DockerHost {
            self.docker_host_path = Some(path);
            self.socket_source = SocketSource::Preferences;
        }
    }

    pub fn set_refresh_interval(&mut self, secs: f64) -> anyhow::Result<()> {
        let interval = interval_from_secs(secs).with_context(|| {
            format!("invalid refresh interval {secs}: expected positive seconds")
        })?;
        self.stored.refresh_interval = Some(secs);
        self.refresh_interval = interval;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.stored.save_to(&self.preferences_path)
    }
}

fn stored_socket(prefs: &Preferences) -> Option<PathBuf> {
    prefs
        .docker_host_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// A usable refresh interval: positive and representable as a `Duration`.
fn interval_from_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|interval| !interval.is_zero())
}

/// `$BULKHEAD_CONFIG`, else `<config dir>/bulkhead/preferences.yaml`.
pub fn preferences_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("BULKHEAD_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let dir = dirs::config_dir().context("no configuration directory for this user")?;
    Ok(dir.join("bulkhead").join("preferences.yaml"))
}

/// Extracts the socket path from a `unix://` `DOCKER_HOST` value.
pub fn socket_path_from_docker_host(value: &str) -> Option<PathBuf> {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "unix" && !url.path().is_empty() => {
            Some(PathBuf::from(url.path()))
        }
        Ok(url) => {
            debug!(scheme = url.scheme(), "Ignoring non-unix DOCKER_HOST");
            None
        }
        Err(e) => {
            debug!(value = %value, error = %e, "Ignoring unparsable DOCKER_HOST");
            None
        }
    }
}
