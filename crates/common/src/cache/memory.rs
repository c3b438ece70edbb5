//! In-process network cache with per-entry expiry. Expired entries are
//! dropped when read and swept on every write.

use super::{CachedNetwork, NetworkCache};
use crate::errors::Result;
use crate::models::NetworkResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache held in process memory
pub struct MemoryNetworkCache {
    entries: RwLock<HashMap<String, CachedNetwork>>,
    ttl: Duration,
}

impl MemoryNetworkCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NetworkCache for MemoryNetworkCache {
    async fn get(&self, key: &str) -> Result<Option<NetworkResult>> {
        let now = Utc::now();
        let (hit, expired) = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(e) if e.is_expired(now) => (None, true),
                Some(e) => (Some(e.network_data.clone()), false),
                None => (None, false),
            }
        };

        if expired {
            let mut entries = self.entries.write().await;
            // Another writer may have refreshed it in between
            if entries.get(key).is_some_and(|e| e.is_expired(now)) {
                entries.remove(key);
            }
        }

        debug!(key, hit = hit.is_some(), "Memory cache lookup");
        Ok(hit)
    }

    async fn put(&self, key: &str, root_paper_id: &str, network: &NetworkResult) -> Result<()> {
        let entry = CachedNetwork::new(root_paper_id, network, self.ttl);
        let now = Utc::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}
