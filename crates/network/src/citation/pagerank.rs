//! PageRank-based importance scoring
//!
//! Runs a fixed number of PageRank iterations over the built network and
//! writes the score and a render size onto every node.

use super::CitationGraph;
use crate::errors::RankError;
use paperweb_common::models::{NetworkEdge, NetworkNode};

/// Smallest render size after ranking
pub const MIN_RANKED_SIZE: f64 = 15.0;

/// Score to render size multiplier
const SIZE_SCALE: f64 = 1000.0;

/// PageRank configuration
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,

    /// Number of iterations, no convergence check
    pub iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            iterations: 20,
        }
    }
}

/// PageRank scorer for papers
#[derive(Debug, Clone, Default)]
pub struct PageRankScorer {
    config: PageRankConfig,
}

impl PageRankScorer {
    /// Create a new scorer
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    fn validate(&self) -> Result<(), RankError> {
        let damping = self.config.damping;
        if !(0.0..=1.0).contains(&damping) {
            return Err(RankError::InvalidDamping(damping));
        }
        if self.config.iterations == 0 {
            return Err(RankError::NoIterations);
        }
        Ok(())
    }

    /// Compute PageRank scores, indexed like the graph's nodes
    pub fn compute(&self, graph: &CitationGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }

        let n_f64 = n as f64;
        let damping = self.config.damping;
        let teleport = (1.0 - damping) / n_f64;

        let mut scores = vec![1.0 / n_f64; n];

        for _ in 0..self.config.iterations {
            let mut next = vec![teleport; n];

            for (node, &score) in scores.iter().enumerate() {
                let out_degree = graph.out_degree(node);
                if out_degree == 0 {
                    // Dangling node, its mass is not redistributed
                    continue;
                }

                let share = damping * score / out_degree as f64;
                for &cited in graph.references(node) {
                    next[cited] += share;
                }
            }

            scores = next;
        }

        scores
    }

    /// Score nodes in place and derive their render size
    pub fn rank(&self, nodes: &mut [NetworkNode], edges: &[NetworkEdge]) -> Result<(), RankError> {
        self.validate()?;
        if nodes.is_empty() {
            return Ok(());
        }

        let graph = CitationGraph::from_network(nodes, edges);
        let scores = self.compute(&graph);

        for (node, score) in nodes.iter_mut().zip(scores) {
            node.page_rank_score = score;
            node.size = (score * SIZE_SCALE).max(MIN_RANKED_SIZE);
        }

        Ok(())
    }
}
