//! Short-lived cache of enriched containers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::docker::models::Container;

/// How long an enrichment stays fresh.
pub const DEFAULT_ENRICHMENT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct CacheEntry {
    container: Container,
    stored_at: Instant,
}

/// Enriched containers keyed by id.
///
/// Lookups share a read lock; inserts take the write lock. Entries are
/// replaced by the next enrichment after they expire and are never
/// evicted otherwise.
#[derive(Debug)]
pub struct EnrichmentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for EnrichmentCache {
    fn default() -> Self {
        Self::new(DEFAULT_ENRICHMENT_TTL)
    }
}

impl EnrichmentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached container if it is younger than the TTL.
    pub async fn get(&self, id: &str) -> Option<Container> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.container.clone())
    }

    pub async fn insert(&self, container: Container) {
        let mut entries = self.entries.write().await;
        entries.insert(
            container.id.clone(),
            CacheEntry {
                container,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
