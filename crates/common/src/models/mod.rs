//! Data model shared by the builder, the cache and the gateway

pub mod network;
pub mod paper;

pub use network::{
    EdgeType, NetworkEdge, NetworkNode, NetworkResult, DEFAULT_NODE_COLOR, DEGRADED_NODE_COLOR, ROOT_COLOR,
    UNTITLED_LABEL,
};
pub use paper::{PaperRecord, PaperRef};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default traversal depth
pub const DEFAULT_DEPTH: u32 = 1;

/// Default node budget
pub const DEFAULT_MAX_NODES: u32 = 200;

/// Deepest traversal accepted from callers
pub const MAX_DEPTH: u32 = 3;

/// Largest node budget accepted from callers
pub const MAX_NODES: u32 = 500;

/// Network request from the boundary
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NetworkRequest {
    /// Paper identifier (DOI, arXiv ID, OpenAlex ID or provider ID)
    #[serde(default)]
    pub paper_id: Option<String>,

    #[serde(default = "default_depth")]
    #[validate(range(min = 1, max = MAX_DEPTH))]
    pub depth: u32,

    #[serde(default = "default_max_nodes")]
    #[validate(range(min = 1, max = MAX_NODES))]
    pub max_nodes: u32,
}

fn default_depth() -> u32 { DEFAULT_DEPTH }
fn default_max_nodes() -> u32 { DEFAULT_MAX_NODES }

impl NetworkRequest {
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: Some(paper_id.into()),
            depth: DEFAULT_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: u32) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Trimmed paper ID, `None` when absent or blank
    pub fn paper_id(&self) -> Option<&str> {
        self.paper_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Network response returned to the boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub data: NetworkResult,

    /// Served from the network cache
    pub cached: bool,

    /// Set when the network is a degraded placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: NetworkRequest = serde_json::from_str(r#"{"paper_id": "abc"}"#).unwrap();
        assert_eq!(request.depth, DEFAULT_DEPTH);
        assert_eq!(request.max_nodes, DEFAULT_MAX_NODES);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_blank_paper_id() {
        let request: NetworkRequest = serde_json::from_str(r#"{"paper_id": "   "}"#).unwrap();
        assert!(request.paper_id().is_none());

        let request: NetworkRequest = serde_json::from_str("{}").unwrap();
        assert!(request.paper_id().is_none());
    }

    #[test]
    fn test_request_range_validation() {
        assert!(NetworkRequest::new("abc").with_depth(0).validate().is_err());
        assert!(NetworkRequest::new("abc").with_depth(MAX_DEPTH + 1).validate().is_err());
        assert!(NetworkRequest::new("abc").with_max_nodes(0).validate().is_err());
        assert!(NetworkRequest::new("abc").with_max_nodes(MAX_NODES).validate().is_ok());
        assert!(NetworkRequest::new("abc").with_max_nodes(MAX_NODES + 1).validate().is_err());
        assert!(NetworkRequest::new("abc").with_depth(MAX_DEPTH).validate().is_ok());
    }

    #[test]
    fn test_response_omits_empty_warning() {
        let response = NetworkResponse {
            data: NetworkResult::default(),
            cached: true,
            warning: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("warning").is_none());
        assert_eq!(json["cached"], true);
    }
}
