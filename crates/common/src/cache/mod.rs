//! Network cache
//!
//! Provides:
//! - Content-addressed keys for (paper ID, depth, node budget)
//! - The `NetworkCache` seam used by the network service
//! - Redis, PostgREST and in-memory backends with expiry

mod memory;
mod redis_store;
mod rest;

pub use memory::MemoryNetworkCache;
pub use redis_store::{Cache, CacheConfig};
pub use rest::{RestCacheConfig, RestNetworkCache};

use crate::config::NetworkCacheConfig;
use crate::errors::{AppError, Result};
use crate::models::NetworkResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

/// Length of the hex key prefix
pub const KEY_LENGTH: usize = 16;

/// Longest entry lifetime a backend accepts (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 3600;

/// Configured TTL bounded to `1..=MAX_TTL_SECS`
pub fn clamp_ttl_secs(ttl_secs: u64) -> u64 {
    ttl_secs.clamp(1, MAX_TTL_SECS)
}

/// Entry lifetime for a configured TTL, bounded like [`clamp_ttl_secs`]
pub fn ttl_duration(ttl_secs: u64) -> Duration {
    Duration::seconds(clamp_ttl_secs(ttl_secs) as i64)
}

/// Store of previously built networks
#[async_trait]
pub trait NetworkCache: Send + Sync {
    /// Get an unexpired network by key
    async fn get(&self, key: &str) -> Result<Option<NetworkResult>>;

    /// Store a network under a key
    async fn put(&self, key: &str, root_paper_id: &str, network: &NetworkResult) -> Result<()>;

    /// Backend name for logs and readiness checks
    fn backend(&self) -> &str;

    /// Connectivity check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache key for a network request
pub fn network_key(paper_id: &str, depth: u32, max_nodes: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}_{}", paper_id, depth, max_nodes));
    let hash = hex::encode(hasher.finalize());
    hash[..KEY_LENGTH].to_string()
}

/// Stored network with its bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedNetwork {
    pub root_paper_id: String,
    pub network_data: NetworkResult,
    pub node_count: usize,
    pub edge_count: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedNetwork {
    pub fn new(root_paper_id: &str, network: &NetworkResult, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            root_paper_id: root_paper_id.to_string(),
            network_data: network.clone(),
            node_count: network.nodes.len(),
            edge_count: network.edges.len(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Create the configured cache backend
///
/// Returns `None` when caching is disabled or Redis is unreachable.
pub async fn create_network_cache(config: &NetworkCacheConfig) -> Result<Option<Arc<dyn NetworkCache>>> {
    let ttl_secs = clamp_ttl_secs(config.ttl_secs);

    match config.backend.as_str() {
        "redis" => {
            let cache_config = CacheConfig {
                url: config.redis_url.clone(),
                default_ttl_secs: ttl_secs,
                key_prefix: config.key_prefix.clone(),
            };
            match Cache::new(cache_config).await {
                Ok(cache) => {
                    info!("Redis network cache connected");
                    Ok(Some(Arc::new(cache)))
                }
                Err(e) => {
                    warn!(error = %e, "Failed to connect to Redis, caching disabled");
                    Ok(None)
                }
            }
        }
        "postgrest" => {
            let rest_config = RestCacheConfig::from_config(config)?;
            Ok(Some(Arc::new(RestNetworkCache::new(rest_config)?)))
        }
        "memory" => Ok(Some(Arc::new(MemoryNetworkCache::new(ttl_duration(ttl_secs))))),
        "disabled" | "none" => {
            warn!("Network cache disabled");
            Ok(None)
        }
        other => Err(AppError::Configuration {
            message: format!("Unknown cache backend: {}", other),
        }),
    }
}
