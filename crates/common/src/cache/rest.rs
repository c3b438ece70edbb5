//! PostgREST network cache
//!
//! Stores networks in the `paper_networks` table of a Supabase project.
//! Expired rows are filtered server side through `expires_at`.

use super::{clamp_ttl_secs, ttl_duration, CachedNetwork, NetworkCache};
use crate::config::NetworkCacheConfig;
use crate::errors::{AppError, Result};
use crate::models::NetworkResult;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Table holding cached networks
const NETWORKS_TABLE: &str = "paper_networks";

/// Request timeout for cache calls in seconds
const REST_TIMEOUT_SECS: u64 = 10;

/// PostgREST connection settings
#[derive(Debug, Clone)]
pub struct RestCacheConfig {
    /// Project base URL, without the `/rest/v1` suffix
    pub base_url: String,
    /// Service role key
    pub service_key: String,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl RestCacheConfig {
    /// Extract PostgREST settings, failing when the project is not configured
    pub fn from_config(config: &NetworkCacheConfig) -> Result<Self> {
        let base_url = config
            .rest_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::CacheConfigMissing {
                message: "cache.rest_url is not set".to_string(),
            })?;

        let service_key = config
            .service_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::CacheConfigMissing {
                message: "cache.service_key is not set".to_string(),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            ttl_secs: clamp_ttl_secs(config.ttl_secs),
        })
    }
}

/// Row as stored in `paper_networks`
#[derive(Debug, Serialize)]
struct NetworkRow<'a> {
    query_hash: &'a str,
    root_paper_id: &'a str,
    network_data: &'a NetworkResult,
    node_count: usize,
    edge_count: usize,
    created_at: String,
    expires_at: String,
}

#[derive(Debug, Deserialize)]
struct NetworkDataRow {
    network_data: NetworkResult,
}

/// Network cache backed by PostgREST
pub struct RestNetworkCache {
    client: reqwest::Client,
    config: RestCacheConfig,
}

impl RestNetworkCache {
    pub fn new(config: RestCacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, NETWORKS_TABLE)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("apikey", &self.config.service_key)
    }
}

#[async_trait]
impl NetworkCache for RestNetworkCache {
    async fn get(&self, key: &str) -> Result<Option<NetworkResult>> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let hash_filter = format!("eq.{}", key);
        let expiry_filter = format!("gt.{}", now);

        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[
                ("query_hash", hash_filter.as_str()),
                ("expires_at", expiry_filter.as_str()),
                ("select", "network_data"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Cache lookup failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::CacheError {
                message: format!("Cache lookup returned {}", response.status()),
            });
        }

        let rows: Vec<NetworkDataRow> = response.json().await.map_err(|e| AppError::CacheError {
            message: format!("Failed to parse cached network: {}", e),
        })?;

        debug!(key, hit = !rows.is_empty(), "PostgREST cache lookup");
        Ok(rows.into_iter().next().map(|row| row.network_data))
    }

    async fn put(&self, key: &str, root_paper_id: &str, network: &NetworkResult) -> Result<()> {
        let entry = CachedNetwork::new(root_paper_id, network, ttl_duration(self.config.ttl_secs));
        let row = NetworkRow {
            query_hash: key,
            root_paper_id,
            network_data: network,
            node_count: entry.node_count,
            edge_count: entry.edge_count,
            created_at: entry.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            expires_at: entry.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        // Upsert on query_hash so concurrent builds resolve as last write wins
        let response = self
            .authorized(self.client.post(self.table_url()))
            .query(&[("on_conflict", "query_hash")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Cache write failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CacheError {
                message: format!("Cache write returned {}: {}", status, body),
            });
        }

        debug!(key, nodes = entry.node_count, "PostgREST cache set");
        Ok(())
    }

    fn backend(&self) -> &str {
        "postgrest"
    }
}
