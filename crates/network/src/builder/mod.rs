//! Network Builder
//!
//! Breadth-first crawl from a resolved root paper over its references and
//! citing papers, bounded by a depth limit and a node budget. Papers that
//! cannot be resolved stay in the network as degraded nodes. A build given
//! a deadline stops expanding when it passes and keeps what it has.

mod crawl;

use crate::errors::BuildError;
use crate::source::PaperSource;
use crawl::Crawl;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use paperweb_common::models::{EdgeType, NetworkEdge, NetworkNode, NetworkResult, PaperRecord, PaperRef};
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::Instant as Deadline;
use tracing::{info, instrument, warn};

/// Nodes discovered through a citation are expanded only below this depth
pub const CITATION_EXPANSION_DEPTH: u32 = 2;

/// Per-depth caps on how many references and citations are followed
#[derive(Debug, Clone, PartialEq)]
pub struct FanOut {
    /// Reference caps for depth 0, 1, 2, ...
    pub references: Vec<usize>,
    /// Reference cap beyond the listed depths
    pub reference_tail: usize,
    /// Citation caps for depth 0, 1, 2, ...
    pub citations: Vec<usize>,
    /// Citation cap beyond the listed depths
    pub citation_tail: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self {
            references: vec![20, 15, 10],
            reference_tail: 5,
            citations: vec![15, 8, 3],
            citation_tail: 0,
        }
    }
}

impl FanOut {
    pub fn references_at(&self, depth: u32) -> usize {
        self.references.get(depth as usize).copied().unwrap_or(self.reference_tail)
    }

    pub fn citations_at(&self, depth: u32) -> usize {
        self.citations.get(depth as usize).copied().unwrap_or(self.citation_tail)
    }
}

/// A built network and whether the deadline cut it short
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub network: NetworkResult,
    pub truncated: bool,
}

/// Why expansion stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Budget,
    Deadline,
}

/// Run `fut` to completion, or until `deadline` passes
pub(crate) async fn within<F: Future>(deadline: Option<Deadline>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[derive(Debug, Default)]
struct CrawlStats {
    resolved: usize,
    degraded: usize,
}

/// Builds citation networks from a paper source
pub struct NetworkBuilder {
    source: Arc<dyn PaperSource>,
    fan_out: FanOut,
    request_interval: Duration,
}

impl NetworkBuilder {
    /// Builder without pacing and with the default fan-out
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self {
            source,
            fan_out: FanOut::default(),
            request_interval: Duration::ZERO,
        }
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Minimum spacing between upstream resolutions, zero disables pacing
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Build the network around an already resolved root
    pub async fn build(&self, root: PaperRecord, max_depth: u32, max_nodes: u32) -> Result<NetworkResult, BuildError> {
        self.build_until(root, max_depth, max_nodes, None)
            .await
            .map(|outcome| outcome.network)
    }

    /// Build the network, returning the partial result once `deadline` passes
    #[instrument(skip(self, root, deadline), fields(root_id = %root.id))]
    pub async fn build_until(
        &self,
        root: PaperRecord,
        max_depth: u32,
        max_nodes: u32,
        deadline: Option<Deadline>,
    ) -> Result<BuildOutcome, BuildError> {
        if max_depth == 0 || max_nodes == 0 {
            return Err(BuildError::InvalidBudget { max_depth, max_nodes });
        }

        let started = Instant::now();
        let pacer = Quota::with_period(self.request_interval).map(RateLimiter::direct);
        let mut crawl = Crawl::new(root, max_nodes as usize);
        let mut stats = CrawlStats::default();
        let mut truncated = false;

        while !crawl.is_full() {
            let Some((paper, depth)) = crawl.next() else {
                break;
            };

            if depth >= max_depth {
                continue;
            }

            let flow = self
                .expand(&mut crawl, &mut stats, pacer.as_ref(), deadline, &paper, depth, max_depth)
                .await;

            if flow == ControlFlow::Break(Halt::Deadline) {
                warn!(nodes = crawl.node_count(), "Build deadline reached, keeping partial network");
                truncated = true;
                break;
            }
        }

        info!(
            nodes = crawl.node_count(),
            edges = crawl.edge_count(),
            resolved = stats.resolved,
            degraded = stats.degraded,
            truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Network build finished"
        );

        Ok(BuildOutcome {
            network: crawl.into_result(),
            truncated,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn expand(
        &self,
        crawl: &mut Crawl,
        stats: &mut CrawlStats,
        pacer: Option<&DefaultDirectRateLimiter>,
        deadline: Option<Deadline>,
        paper: &PaperRecord,
        depth: u32,
        max_depth: u32,
    ) -> ControlFlow<Halt> {
        let next_depth = depth + 1;

        for reference in paper.references.iter().take(self.fan_out.references_at(depth)) {
            let edge = NetworkEdge::new(paper.id.as_str(), reference.id.as_str(), EdgeType::Reference);
            let expandable = next_depth < max_depth;

            self.link(crawl, stats, pacer, deadline, reference, edge, next_depth, expandable)
                .await?;
        }

        for citation in paper.citations.iter().take(self.fan_out.citations_at(depth)) {
            let edge = NetworkEdge::new(citation.id.as_str(), paper.id.as_str(), EdgeType::Citation);
            let expandable = next_depth < max_depth && next_depth < CITATION_EXPANSION_DEPTH;

            self.link(crawl, stats, pacer, deadline, citation, edge, next_depth, expandable)
                .await?;
        }

        ControlFlow::Continue(())
    }

    /// Connect a neighbour, resolving it on first sight. Breaks when the
    /// neighbour is new and either the node budget or the deadline is spent;
    /// nothing is recorded for that neighbour in either case.
    #[allow(clippy::too_many_arguments)]
    async fn link(
        &self,
        crawl: &mut Crawl,
        stats: &mut CrawlStats,
        pacer: Option<&DefaultDirectRateLimiter>,
        deadline: Option<Deadline>,
        neighbour: &PaperRef,
        edge: NetworkEdge,
        depth: u32,
        expandable: bool,
    ) -> ControlFlow<Halt> {
        if neighbour.id.is_empty() {
            return ControlFlow::Continue(());
        }

        if crawl.contains(&neighbour.id) {
            crawl.add_edge(edge);
            return ControlFlow::Continue(());
        }

        if crawl.is_full() {
            return ControlFlow::Break(Halt::Budget);
        }

        let resolution = async {
            if let Some(pacer) = pacer {
                pacer.until_ready().await;
            }
            self.source.resolve(&neighbour.id).await
        };

        let Some(resolved) = within(deadline, resolution).await else {
            return ControlFlow::Break(Halt::Deadline);
        };

        crawl.add_edge(edge);

        match resolved {
            Ok(mut record) => {
                // Key by the id we were given so edges stay consistent
                record.id = neighbour.id.clone();
                crawl.add_node(NetworkNode::from_record(&record, depth, false));
                stats.resolved += 1;

                if expandable {
                    crawl.enqueue(record, depth);
                }
            }
            Err(e) => {
                warn!(paper_id = %neighbour.id, depth, error = %e, "Failed to resolve paper, keeping degraded node");
                crawl.add_node(NetworkNode::degraded(neighbour, depth));
                stats.degraded += 1;
            }
        }

        ControlFlow::Continue(())
    }
}
