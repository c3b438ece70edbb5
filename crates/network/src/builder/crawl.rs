//! Traversal state owned by a single build

use paperweb_common::models::{EdgeType, NetworkEdge, NetworkNode, NetworkResult, PaperRecord};
use std::collections::{HashMap, HashSet, VecDeque};

/// Nodes, edges and the work queue of one build
pub(crate) struct Crawl {
    nodes: Vec<NetworkNode>,
    index: HashMap<String, usize>,
    edges: Vec<NetworkEdge>,
    edge_keys: HashSet<(String, String, EdgeType)>,
    queue: VecDeque<(PaperRecord, u32)>,
    max_nodes: usize,
}

impl Crawl {
    /// Seed the crawl with the root at depth 0
    pub fn new(root: PaperRecord, max_nodes: usize) -> Self {
        let mut crawl = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            queue: VecDeque::new(),
            max_nodes,
        };

        crawl.add_node(NetworkNode::from_record(&root, 0, true));
        crawl.queue.push_back((root, 0));
        crawl
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.max_nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Insert a node unless one with the same id exists. Depth is fixed at
    /// first discovery.
    pub fn add_node(&mut self, node: NetworkNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Record an edge once per (from, to, type)
    pub fn add_edge(&mut self, edge: NetworkEdge) -> bool {
        if !self.edge_keys.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn enqueue(&mut self, paper: PaperRecord, depth: u32) {
        self.queue.push_back((paper, depth));
    }

    pub fn next(&mut self) -> Option<(PaperRecord, u32)> {
        self.queue.pop_front()
    }

    pub fn into_result(self) -> NetworkResult {
        NetworkResult {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
