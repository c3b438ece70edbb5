//! Redis cache integration
//!
//! Provides:
//! - Multiplexed connection management
//! - Generic get/set operations with TTL
//! - Network storage with expiry envelopes

use super::{clamp_ttl_secs, ttl_duration, CachedNetwork, NetworkCache};
use crate::errors::{AppError, Result};
use crate::models::NetworkResult;
use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// Default TTL in seconds
    pub default_ttl_secs: u64,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            default_ttl_secs: 7 * 24 * 3600,
            key_prefix: "paperweb:network".to_string(),
        }
    }
}

/// Redis cache client
pub struct Cache {
    connection: MultiplexedConnection,
    config: CacheConfig,
}

impl Cache {
    /// Create a new cache client
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to create Redis client: {}", e)
            })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self { connection, config })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        prefixed_key(&self.config.key_prefix, key)
    }

    /// Get a value from cache
    pub async fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let full_key = self.key(key);
        let mut conn = self.connection.clone();

        let value: Option<String> = conn.get(&full_key).await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to get key '{}': {}", full_key, e),
            })?;

        match value {
            Some(json) => {
                let parsed = serde_json::from_str(&json)
                    .map_err(|e| AppError::CacheError {
                        message: format!("Failed to parse cached value: {}", e),
                    })?;
                debug!(key = %full_key, "Cache hit");
                Ok(Some(parsed))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Set a value in cache with custom TTL
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let full_key = self.key(key);
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to serialize value: {}", e),
            })?;

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&full_key, &json, ttl_secs)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to set key '{}': {}", full_key, e),
            })?;

        debug!(key = %full_key, ttl_secs, "Cache set");
        Ok(())
    }
}

#[async_trait]
impl NetworkCache for Cache {
    async fn get(&self, key: &str) -> Result<Option<NetworkResult>> {
        let entry: Option<CachedNetwork> = self.get_value(key).await?;
        Ok(entry
            .filter(|e| !e.is_expired(Utc::now()))
            .map(|e| e.network_data))
    }

    async fn put(&self, key: &str, root_paper_id: &str, network: &NetworkResult) -> Result<()> {
        let ttl_secs = clamp_ttl_secs(self.config.default_ttl_secs);
        let entry = CachedNetwork::new(root_paper_id, network, ttl_duration(ttl_secs));
        self.set_with_ttl(key, &entry, ttl_secs).await
    }

    fn backend(&self) -> &str {
        "redis"
    }

    /// Ping Redis to check connectivity
    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_key() {
        assert_eq!(prefixed_key("paperweb:network", "abc123"), "paperweb:network:abc123");
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert!(config.url.starts_with("redis://"));
        assert_eq!(config.default_ttl_secs, 604_800);
    }
}
