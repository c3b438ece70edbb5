//! Citation network nodes, edges and the built network

use super::paper::{PaperRecord, PaperRef};
use serde::{Deserialize, Serialize};

/// Render color of the root node
pub const ROOT_COLOR: &str = "#ff6b35";

/// Render color of a resolved node before clustering
pub const DEFAULT_NODE_COLOR: &str = "#1e3a8a";

/// Neutral render color of a degraded node
pub const DEGRADED_NODE_COLOR: &str = "#9ca3af";

/// Label used when a paper has no title
pub const UNTITLED_LABEL: &str = "Untitled";

/// Smallest render size derived from the citation count
const MIN_INITIAL_SIZE: f64 = 10.0;

/// Node in a citation network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    /// Paper ID (unique per network)
    pub id: String,

    /// Display label
    pub label: String,

    pub title: String,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    pub citation_count: u64,

    /// Comma separated author names
    pub authors: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    #[serde(default)]
    pub fields_of_study: Vec<String>,

    /// Whether this is the paper the network was built around
    pub is_root: bool,

    /// Traversal step at which the node was first discovered
    pub depth: u32,

    /// PageRank importance (0.0 - 1.0)
    pub page_rank_score: f64,

    /// Connected component ID
    pub cluster_id: u32,

    /// Render size hint
    pub size: f64,

    /// Render color hint
    pub color: String,

    /// Synthesized from a bare reference because resolution failed
    #[serde(default)]
    pub degraded: bool,
}

impl NetworkNode {
    /// Build a node from a resolved paper
    pub fn from_record(record: &PaperRecord, depth: u32, is_root: bool) -> Self {
        Self {
            id: record.id.clone(),
            label: display_label(&record.title),
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            year: record.year,
            citation_count: record.citation_count,
            authors: record.authors.join(", "),
            venue: record.venue.clone(),
            url: record.url.clone(),
            pdf_url: record.pdf_url.clone(),
            fields_of_study: record.fields_of_study.clone(),
            is_root,
            depth,
            page_rank_score: 0.0,
            cluster_id: 0,
            size: initial_size(record.citation_count),
            color: if is_root { ROOT_COLOR } else { DEFAULT_NODE_COLOR }.to_string(),
            degraded: false,
        }
    }

    /// Build a degraded node from a reference that could not be resolved
    pub fn degraded(reference: &PaperRef, depth: u32) -> Self {
        let title = reference.title.clone().unwrap_or_default();
        let citation_count = reference.citation_count.unwrap_or(0);

        Self {
            id: reference.id.clone(),
            label: display_label(&title),
            title,
            abstract_text: None,
            year: reference.year,
            citation_count,
            authors: String::new(),
            venue: None,
            url: None,
            pdf_url: None,
            fields_of_study: Vec::new(),
            is_root: false,
            depth,
            page_rank_score: 0.0,
            cluster_id: 0,
            size: initial_size(citation_count),
            color: DEGRADED_NODE_COLOR.to_string(),
            degraded: true,
        }
    }

    /// Single node network placeholder for a root that could not be resolved
    pub fn unresolved_root(paper_id: &str) -> Self {
        let mut node = Self::degraded(&PaperRef::new(paper_id), 0);
        node.is_root = true;
        node.color = ROOT_COLOR.to_string();
        node
    }
}

fn display_label(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED_LABEL.to_string()
    } else {
        title.to_string()
    }
}

fn initial_size(citation_count: u64) -> f64 {
    ((citation_count as f64 + 1.0).log10() * 10.0).max(MIN_INITIAL_SIZE)
}

/// Edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// `from` cites `to`, found in `from`'s reference list
    Reference,
    /// `from` cites `to`, found in `to`'s cited-by list
    Citation,
}

/// Directed edge between two papers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: f64,
}

impl NetworkEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type,
            weight: 1.0,
        }
    }

    /// Deduplication key
    pub fn key(&self) -> (String, String, EdgeType) {
        (self.from.clone(), self.to.clone(), self.edge_type)
    }
}

/// Citation network built around a root paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkResult {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl NetworkResult {
    /// Network holding only an unresolved root
    pub fn placeholder(paper_id: &str) -> Self {
        Self {
            nodes: vec![NetworkNode::unresolved_root(paper_id)],
            edges: Vec::new(),
        }
    }

    /// The root node, if present
    pub fn root(&self) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.is_root)
    }

    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_from_record() {
        let mut record = PaperRecord::new("P0", "Attention Is All You Need");
        record.authors = vec!["Ashish Vaswani".into(), "Noam Shazeer".into()];
        record.citation_count = 999;

        let node = NetworkNode::from_record(&record, 0, true);

        assert_eq!(node.label, "Attention Is All You Need");
        assert_eq!(node.authors, "Ashish Vaswani, Noam Shazeer");
        assert_eq!(node.color, ROOT_COLOR);
        assert!((node.size - 30.0).abs() < 1e-9);
        assert!(!node.degraded);
    }

    #[test]
    fn test_degraded_node_keeps_reference_fields() {
        let mut reference = PaperRef::new("R2").with_title("Some Reference");
        reference.year = Some(2017);

        let node = NetworkNode::degraded(&reference, 1);

        assert_eq!(node.title, "Some Reference");
        assert_eq!(node.year, Some(2017));
        assert_eq!(node.citation_count, 0);
        assert_eq!(node.color, DEGRADED_NODE_COLOR);
        assert_eq!(node.size, 10.0);
        assert!(node.abstract_text.is_none());
        assert!(node.degraded);
    }

    #[test]
    fn test_untitled_label() {
        let node = NetworkNode::degraded(&PaperRef::new("X"), 2);
        assert_eq!(node.label, UNTITLED_LABEL);
    }

    #[test]
    fn test_placeholder_network() {
        let network = NetworkResult::placeholder("10.1000/xyz");
        let root = network.root().unwrap();

        assert_eq!(network.nodes.len(), 1);
        assert!(network.edges.is_empty());
        assert_eq!(root.id, "10.1000/xyz");
        assert_eq!(root.depth, 0);
        assert!(root.degraded);
    }

    #[test]
    fn test_edge_serialization() {
        let edge = NetworkEdge::new("A", "B", EdgeType::Citation);
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["type"], "citation");
        assert_eq!(json["from"], "A");
        assert_eq!(json["weight"], 1.0);
    }
}
