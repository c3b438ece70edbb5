//! Network service
//!
//! Request-level orchestration: validate, look up the cache, resolve the
//! root, build, rank, label and store. A configured build timeout bounds
//! the whole request; past it the caller gets what was built so far.

use crate::builder::{within, BuildOutcome, FanOut, NetworkBuilder};
use crate::citation::{CommunityLabeler, PageRankScorer};
use crate::errors::SourceError;
use crate::source::{PaperSource, RetryPolicy, SemanticScholarClient};
use paperweb_common::cache::{network_key, NetworkCache};
use paperweb_common::config::AppConfig;
use paperweb_common::errors::{AppError, Result};
use paperweb_common::metrics;
use paperweb_common::models::{NetworkRequest, NetworkResponse, NetworkResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Builds citation networks for boundary requests
pub struct NetworkService {
    source: Arc<dyn PaperSource>,
    cache: Option<Arc<dyn NetworkCache>>,
    builder: NetworkBuilder,
    ranker: PageRankScorer,
    labeler: CommunityLabeler,
    build_timeout: Option<Duration>,
}

impl NetworkService {
    /// Service without request pacing
    pub fn new(source: Arc<dyn PaperSource>, cache: Option<Arc<dyn NetworkCache>>) -> Self {
        Self {
            builder: NetworkBuilder::new(source.clone()),
            source,
            cache,
            ranker: PageRankScorer::default(),
            labeler: CommunityLabeler::default(),
            build_timeout: None,
        }
    }

    /// Service backed by Semantic Scholar, paced according to the API key setup
    pub fn from_config(config: &AppConfig, cache: Option<Arc<dyn NetworkCache>>) -> Result<Self> {
        let client = SemanticScholarClient::new(&config.source, RetryPolicy::from_config(&config.retry))
            .map_err(|e| AppError::Configuration {
                message: e.to_string(),
            })?;

        let interval = config.crawl.request_interval(client.has_api_key());
        info!(
            source = client.name(),
            has_api_key = client.has_api_key(),
            interval_ms = interval.as_millis() as u64,
            "Paper source configured"
        );

        let mut service = Self::new(Arc::new(client), cache).with_request_interval(interval);
        if let Some(timeout) = config.crawl.build_timeout() {
            service = service.with_build_timeout(timeout);
        }

        Ok(service)
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.builder = self.builder.with_request_interval(interval);
        self
    }

    /// Bound each request; the partial network is returned when it runs out
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = Some(timeout);
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.builder = self.builder.with_fan_out(fan_out);
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn NetworkCache>> {
        self.cache.as_ref()
    }

    /// Build (or fetch from cache) the network for a request
    #[instrument(skip(self, request), fields(paper_id = ?request.paper_id, depth = request.depth, max_nodes = request.max_nodes))]
    pub async fn fetch_network(&self, request: &NetworkRequest) -> Result<NetworkResponse> {
        let paper_id = request.paper_id().ok_or(AppError::MissingPaperId)?;
        request.validate()?;

        let key = network_key(paper_id, request.depth, request.max_nodes);

        if let Some(network) = self.cached(&key).await {
            return Ok(NetworkResponse {
                data: network,
                cached: true,
                warning: None,
            });
        }

        let started = Instant::now();
        let deadline = self.build_timeout.map(|t| tokio::time::Instant::now() + t);

        let Some(resolved) = within(deadline, self.source.resolve(paper_id)).await else {
            warn!(paper_id, "Root paper resolution timed out, returning placeholder");
            return Ok(self.placeholder(
                paper_id,
                started,
                format!("Timed out resolving paper {}", paper_id),
            ));
        };

        let root = match resolved {
            Ok(root) => root,
            Err(SourceError::InvalidIdentifier { input }) => {
                metrics::record_build(started.elapsed().as_secs_f64(), "invalid_identifier", 0, 0);
                return Err(AppError::InvalidIdentifier { id: input });
            }
            Err(e) => {
                warn!(paper_id, error = %e, "Root paper could not be resolved, returning placeholder");
                return Ok(self.placeholder(paper_id, started, format!("Could not resolve paper {}: {}", paper_id, e)));
            }
        };

        let BuildOutcome { mut network, truncated } = match self
            .builder
            .build_until(root, request.depth, request.max_nodes, deadline)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(paper_id, error = %e, "Network build failed, returning placeholder");
                return Ok(self.placeholder(paper_id, started, format!("Network build failed: {}", e)));
            }
        };

        if let Err(e) = self.ranker.rank(&mut network.nodes, &network.edges) {
            warn!(error = %e, "Ranking failed, keeping unranked network");
        }
        let clusters = self.labeler.label(&mut network.nodes, &network.edges);

        let degraded = network.nodes.iter().filter(|n| n.degraded).count();
        let outcome = if truncated { "partial" } else { "success" };
        metrics::record_build(started.elapsed().as_secs_f64(), outcome, network.nodes.len(), degraded);
        info!(
            nodes = network.nodes.len(),
            edges = network.edges.len(),
            clusters,
            degraded,
            truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Network built"
        );

        // Partial networks depend on timing, so only complete ones are cached
        let warning = if truncated {
            Some(format!(
                "Build stopped after {}s, returning a partial network of {} papers",
                self.build_timeout.unwrap_or_default().as_secs(),
                network.nodes.len()
            ))
        } else {
            self.store(&key, paper_id, &network).await;
            None
        };

        Ok(NetworkResponse {
            data: network,
            cached: false,
            warning,
        })
    }

    /// Cache lookup; failures count as misses
    async fn cached(&self, key: &str) -> Option<NetworkResult> {
        let cache = self.cache.as_ref()?;

        match cache.get(key).await {
            Ok(hit) => {
                metrics::record_cache(hit.is_some(), cache.backend());
                if hit.is_some() {
                    debug!(key, "Network cache hit");
                }
                hit
            }
            Err(e) => {
                warn!(key, error = %e, "Network cache read failed, treating as miss");
                metrics::record_cache(false, cache.backend());
                None
            }
        }
    }

    /// Cache write; failures are logged and swallowed
    async fn store(&self, key: &str, paper_id: &str, network: &NetworkResult) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(e) = cache.put(key, paper_id, network).await {
            warn!(key, error = %e, "Network cache write failed");
        }
    }

    fn placeholder(&self, paper_id: &str, started: Instant, warning: String) -> NetworkResponse {
        metrics::record_build(started.elapsed().as_secs_f64(), "placeholder", 1, 1);

        NetworkResponse {
            data: NetworkResult::placeholder(paper_id),
            cached: false,
            warning: Some(warning),
        }
    }
}
