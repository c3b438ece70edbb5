//! Community labeling by connected components

use super::CitationGraph;
use paperweb_common::models::{NetworkEdge, NetworkNode};

/// Cluster colors, indexed by cluster id modulo the palette size
pub const CLUSTER_PALETTE: [&str; 7] = [
    "#1e3a8a", "#dc2626", "#059669", "#7c3aed", "#ea580c", "#0891b2", "#be185d",
];

/// Assigns a cluster id and color to every node.
///
/// Clusters are the connected components of the network with edge
/// direction ignored.
#[derive(Debug, Clone)]
pub struct CommunityLabeler {
    palette: Vec<String>,
}

impl Default for CommunityLabeler {
    fn default() -> Self {
        Self::with_palette(CLUSTER_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl CommunityLabeler {
    /// Labeler with a custom palette; an empty palette leaves colors alone
    pub fn with_palette(palette: Vec<String>) -> Self {
        Self { palette }
    }

    /// Label nodes in place, returning the number of clusters
    pub fn label(&self, nodes: &mut [NetworkNode], edges: &[NetworkEdge]) -> u32 {
        let graph = CitationGraph::from_network(nodes, edges);
        let mut clusters: Vec<Option<u32>> = vec![None; graph.node_count()];
        let mut stack = Vec::new();
        let mut next_cluster = 0u32;

        for start in 0..graph.node_count() {
            if clusters[start].is_some() {
                continue;
            }

            clusters[start] = Some(next_cluster);
            stack.push(start);

            while let Some(node) = stack.pop() {
                for neighbour in graph.neighbours(node) {
                    if clusters[neighbour].is_none() {
                        clusters[neighbour] = Some(next_cluster);
                        stack.push(neighbour);
                    }
                }
            }

            next_cluster += 1;
        }

        for (node, cluster) in nodes.iter_mut().zip(clusters) {
            let cluster_id = cluster.unwrap_or_default();
            node.cluster_id = cluster_id;

            // Root and degraded nodes keep their distinguishing colors
            if node.is_root || node.degraded || self.palette.is_empty() {
                continue;
            }
            node.color = self.palette[cluster_id as usize % self.palette.len()].clone();
        }

        next_cluster
    }
}
