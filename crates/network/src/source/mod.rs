//! Paper Source Client
//!
//! Resolves a paper identifier of unknown format into a [`PaperRecord`]
//! with its reference and citation lists.

mod arxiv;
mod identifier;
mod mock;
mod openalex;
mod retry;
mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use identifier::{classify, IdentifierRule, IdentifierRules, PaperLookup};
pub use mock::MockPaperSource;
pub use openalex::OpenAlexClient;
pub use retry::{BackoffShape, RetryPolicy};
pub use semantic_scholar::SemanticScholarClient;

use crate::errors::SourceError;
use async_trait::async_trait;
use paperweb_common::config::SourceConfig;
use paperweb_common::metrics;
use paperweb_common::models::PaperRecord;
use reqwest::StatusCode;

/// Anything that can resolve paper identifiers
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Resolve an identifier into a full paper record
    async fn resolve(&self, identifier: &str) -> Result<PaperRecord, SourceError>;

    /// Whether the source has an API key (affects pacing)
    fn has_api_key(&self) -> bool {
        false
    }

    /// Source name for logs
    fn name(&self) -> &str;
}

/// Build the HTTP client shared by all upstream calls
pub(crate) fn http_client(config: &SourceConfig) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent())
        .build()
        .map_err(|e| SourceError::unavailable("http", format!("Failed to create HTTP client: {}", e)))
}

/// Map a non-success status onto a source error
pub(crate) fn status_error(service: &str, status: StatusCode, id: &str) -> SourceError {
    metrics::record_upstream(service, status.as_str());

    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound { id: id.to_string() },
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited {
            service: service.to_string(),
        },
        StatusCode::BAD_REQUEST => SourceError::InvalidIdentifier {
            input: id.to_string(),
        },
        s if s.is_server_error() => SourceError::unavailable(service, format!("HTTP {}", s)),
        s => SourceError::unavailable(service, format!("Unexpected HTTP {}", s)),
    }
}

/// Map a transport failure (connect, timeout, body) onto a source error
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> SourceError {
    let kind = if err.is_timeout() { "timeout" } else { "transport" };
    metrics::record_upstream(service, kind);

    SourceError::unavailable(service, format!("{}: {}", kind, err))
}

/// Collapse runs of whitespace, as found in titles and abstracts
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("s2", StatusCode::NOT_FOUND, "P0"),
            SourceError::NotFound { id } if id == "P0"
        ));
        assert!(matches!(
            status_error("s2", StatusCode::TOO_MANY_REQUESTS, "P0"),
            SourceError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error("s2", StatusCode::BAD_REQUEST, "P0"),
            SourceError::InvalidIdentifier { .. }
        ));
        assert!(matches!(
            status_error("s2", StatusCode::BAD_GATEWAY, "P0"),
            SourceError::UpstreamUnavailable { .. }
        ));
        assert!(matches!(
            status_error("s2", StatusCode::FORBIDDEN, "P0"),
            SourceError::UpstreamUnavailable { .. }
        ));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Attention\n  Is All\tYou Need "), "Attention Is All You Need");
    }

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(&SourceConfig::default()).is_ok());
    }
}
