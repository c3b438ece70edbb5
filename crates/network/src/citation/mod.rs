//! Citation network analysis
//!
//! PageRank importance scoring and connected-component clustering over a
//! built network.

mod community;
mod graph;
mod pagerank;

pub use community::{CommunityLabeler, CLUSTER_PALETTE};
pub use graph::CitationGraph;
pub use pagerank::{PageRankConfig, PageRankScorer, MIN_RANKED_SIZE};
