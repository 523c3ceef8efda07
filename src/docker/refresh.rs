//! Periodic container and image list refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::docker::client::DockerClient;
use crate::docker::models::{Container, Image};
use crate::error::DockerError;

/// Latest known lists and the errors from the most recent attempt.
///
/// A failed refresh keeps the previous list and records the error; a
/// successful one clears it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub containers: Vec<Container>,
    pub images: Vec<Image>,
    pub container_error: Option<Arc<DockerError>>,
    pub image_error: Option<Arc<DockerError>>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// True when either list failed because the daemon is unreachable.
    pub fn has_connection_error(&self) -> bool {
        [&self.container_error, &self.image_error]
            .into_iter()
            .flatten()
            .any(|e| e.is_connection_error())
    }
}

pub struct AutoRefresh {
    client: DockerClient,
    interval: Duration,
}

impl AutoRefresh {
    pub fn new(client: DockerClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetches both lists once and folds the results into `snapshot`.
    pub async fn refresh_once(&self, snapshot: &mut Snapshot) {
        match self.client.list_containers().await {
            Ok(list) => {
                snapshot.containers = list;
                snapshot.container_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Container refresh failed");
                snapshot.container_error = Some(Arc::new(e));
            }
        }

        match self.client.list_images().await {
            Ok(list) => {
                snapshot.images = list;
                snapshot.image_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Image refresh failed");
                snapshot.image_error = Some(Arc::new(e));
            }
        }

        snapshot.refreshed_at = Some(Utc::now());
    }

    /// Refreshes on every tick until `cancel` fires, publishing each
    /// snapshot.
    ///
    /// Each refresh finishes before the next tick is awaited, and ticks
    /// missed meanwhile are skipped, so refreshes never overlap.
    pub async fn run(self, tx: watch::Sender<Snapshot>, cancel: CancellationToken) {
        let client = self.client.with_cancellation(cancel.child_token());
        let this = AutoRefresh { client, ..self };

        let mut ticker = tokio::time::interval(this.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut snapshot = tx.borrow().clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Auto-refresh stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            this.refresh_once(&mut snapshot).await;
            if cancel.is_cancelled() {
                return;
            }
            if tx.send(snapshot.clone()).is_err() {
                debug!("No snapshot receivers left, stopping auto-refresh");
                return;
            }
        }
    }
}
