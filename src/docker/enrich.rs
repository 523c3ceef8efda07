//! Filling a listed [`Container`] with detail from its inspect document.

use std::collections::HashMap;

use tracing::debug;

use crate::docker::models::{
    Container, ContainerInspect, HostBinding, MountInfo, PortBinding, parse_timestamp,
};

impl Container {
    /// Returns a copy enriched from a raw inspect JSON document.
    pub fn enrich(&self, detail: &[u8]) -> Result<Container, serde_json::Error> {
        let inspect: ContainerInspect = serde_json::from_slice(detail)?;
        Ok(self.enriched_with(&inspect))
    }

    /// Returns a copy carrying created time, command, environment, health,
    /// mounts and port bindings from `inspect`. Fields the document lacks
    /// keep their current value.
    pub fn enriched_with(&self, inspect: &ContainerInspect) -> Container {
        let mut result = self.clone();

        if let Some(created) = inspect.created.as_deref().and_then(parse_timestamp) {
            result.created = Some(created);
        }

        if let Some(config) = &inspect.config {
            if let Some(cmd) = &config.cmd {
                result.command = Some(cmd.join(" "));
            }
            if let Some(env) = &config.env {
                result.env = env.clone();
            }
        }

        if let Some(status) = inspect
            .state
            .as_ref()
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status.as_deref())
        {
            result.health = Some(capitalize(status));
        }

        if let Some(mounts) = &inspect.mounts {
            result.mounts = mounts
                .iter()
                .filter_map(|m| {
                    Some(MountInfo {
                        source: m.source.clone()?,
                        destination: m.destination.clone()?,
                        mount_type: m.mount_type.clone()?,
                    })
                })
                .collect();
        }

        if let Some(ports) = inspect
            .network_settings
            .as_ref()
            .and_then(|n| n.ports.as_ref())
        {
            result.ports = parse_port_bindings(ports);
        }

        result
    }
}

/// Flattens `NetworkSettings.Ports` into port records.
///
/// Keys look like `"80/tcp"`. Keys that do not parse and ports without
/// host bindings are skipped. Output is sorted for stable display.
pub fn parse_port_bindings(ports: &HashMap<String, Option<Vec<HostBinding>>>) -> Vec<PortBinding> {
    let mut result = Vec::new();

    for (key, bindings) in ports {
        let Some(bindings) = bindings else { continue };

        let Some((private_port, port_type)) = parse_port_key(key) else {
            debug!(key = %key, "Skipping malformed port key");
            continue;
        };

        for binding in bindings {
            result.push(PortBinding {
                ip: binding.host_ip.clone(),
                private_port,
                public_port: binding
                    .host_port
                    .as_deref()
                    .and_then(|p| p.parse().ok()),
                port_type: port_type.to_string(),
            });
        }
    }

    result.sort_by(|a, b| {
        (a.private_port, &a.port_type, &a.ip, a.public_port)
            .cmp(&(b.private_port, &b.port_type, &b.ip, b.public_port))
    });
    result
}

fn parse_port_key(key: &str) -> Option<(u16, &str)> {
    let (port, port_type) = key.split_once('/')?;
    if port_type.is_empty() || port_type.contains('/') {
        return None;
    }
    Some((port.parse().ok()?, port_type))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
