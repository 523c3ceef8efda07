//! Locating the Engine socket on a workstation.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Docker Desktop's default socket.
pub const DOCKER_DESKTOP_SOCKET: &str = "/var/run/docker.sock";

/// Well-known socket locations, in probe order: Docker Desktop, Colima,
/// Rancher Desktop.
pub fn socket_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(DOCKER_DESKTOP_SOCKET)];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".colima").join("docker.sock"));
        candidates.push(home.join(".rd").join("docker.sock"));
    }
    candidates
}

/// First well-known location that holds a socket.
pub fn detect_docker_host_path() -> Option<PathBuf> {
    detect_in(&socket_candidates())
}

pub fn detect_in(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|p| is_socket(p)).cloned();
    match &found {
        Some(path) => debug!(path = %path.display(), "Found Docker socket"),
        None => debug!("No Docker socket found in common locations"),
    }
    found
}

fn is_socket(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.file_type().is_socket(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Socket not accessible");
            false
        }
    }
}

/// Names the Docker provider a socket path belongs to.
pub fn describe_environment(path: &Path) -> &'static str {
    let text = path.to_string_lossy();
    if text.contains("colima") {
        "Colima"
    } else if text.contains(".rd") {
        "Rancher Desktop"
    } else if path == Path::new(DOCKER_DESKTOP_SOCKET) {
        "Docker Desktop"
    } else {
        "Unknown"
    }
}
