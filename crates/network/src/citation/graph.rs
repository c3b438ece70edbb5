//! Citation graph representation
//!
//! Index-based adjacency over a built network, shared by ranking and
//! clustering. Node indices follow the order of the node slice.

use paperweb_common::models::{NetworkEdge, NetworkNode};
use std::collections::HashMap;

/// In-memory citation graph
pub struct CitationGraph {
    /// Paper id -> node index
    index: HashMap<String, usize>,

    /// Adjacency list: node -> nodes it cites (present nodes only)
    outgoing: Vec<Vec<usize>>,

    /// Reverse adjacency: node -> nodes citing it
    incoming: Vec<Vec<usize>>,

    /// Edges leaving each node, counting edges to papers outside the network
    out_degree: Vec<usize>,
}

impl CitationGraph {
    /// Build adjacency from network nodes and edges
    pub fn from_network(nodes: &[NetworkNode], edges: &[NetworkEdge]) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }

        let n = nodes.len();
        let mut graph = Self {
            index,
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
            out_degree: vec![0; n],
        };

        for edge in edges {
            let Some(&from) = graph.index.get(&edge.from) else {
                continue;
            };
            graph.out_degree[from] += 1;

            if let Some(&to) = graph.index.get(&edge.to) {
                graph.outgoing[from].push(to);
                graph.incoming[to].push(from);
            }
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Nodes cited by this node
    pub fn references(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    /// Nodes citing this node
    pub fn citations(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.out_degree[node]
    }

    /// Neighbours ignoring edge direction
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.outgoing[node]
            .iter()
            .chain(self.incoming[node].iter())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperweb_common::models::{EdgeType, PaperRef};

    fn nodes(ids: &[&str]) -> Vec<NetworkNode> {
        ids.iter().map(|id| NetworkNode::degraded(&PaperRef::new(*id), 0)).collect()
    }

    #[test]
    fn test_graph_construction() {
        // A cites B, B cites C
        let nodes = nodes(&["A", "B", "C"]);
        let edges = vec![
            NetworkEdge::new("A", "B", EdgeType::Reference),
            NetworkEdge::new("B", "C", EdgeType::Reference),
        ];

        let graph = CitationGraph::from_network(&nodes, &edges);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.references(0), &[1]);
        assert_eq!(graph.citations(1), &[0]);
        assert_eq!(graph.references(1), &[2]);
        assert_eq!(graph.index_of("C"), Some(2));
    }

    #[test]
    fn test_edges_to_missing_nodes() {
        let nodes = nodes(&["A", "B"]);
        let edges = vec![
            NetworkEdge::new("A", "B", EdgeType::Reference),
            NetworkEdge::new("A", "Z", EdgeType::Reference),
            NetworkEdge::new("Z", "B", EdgeType::Citation),
        ];

        let graph = CitationGraph::from_network(&nodes, &edges);

        assert_eq!(graph.out_degree(0), 2);
        assert_eq!(graph.references(0), &[1]);
        assert_eq!(graph.citations(1), &[0]);
    }

    #[test]
    fn test_neighbours_ignore_direction() {
        let nodes = nodes(&["A", "B", "C"]);
        let edges = vec![
            NetworkEdge::new("A", "B", EdgeType::Reference),
            NetworkEdge::new("C", "B", EdgeType::Citation),
        ];

        let graph = CitationGraph::from_network(&nodes, &edges);
        let mut around_b: Vec<_> = graph.neighbours(1).collect();
        around_b.sort();

        assert_eq!(around_b, vec![0, 2]);
    }
}
