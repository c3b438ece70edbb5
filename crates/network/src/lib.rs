//! PaperWeb Network Builder
//!
//! Turns one paper identifier into a ranked and clustered citation network:
//! - Paper source client (Semantic Scholar, OpenAlex, arXiv fallback)
//! - Bounded breadth-first crawl over references and citations
//! - PageRank importance and connected-component clustering
//! - Cached request orchestration

pub mod builder;
pub mod citation;
pub mod errors;
pub mod service;
pub mod source;

pub use builder::{BuildOutcome, FanOut, NetworkBuilder};
pub use citation::{CommunityLabeler, PageRankConfig, PageRankScorer};
pub use errors::{BuildError, RankError, SourceError};
pub use service::NetworkService;
pub use source::{PaperSource, SemanticScholarClient};
