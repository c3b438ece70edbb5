//! Network builder error types

use paperweb_common::errors::AppError;
use thiserror::Error;

/// Failure of a single upstream paper lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Paper not found: {id}")]
    NotFound { id: String },

    #[error("Rate limited by {service}")]
    RateLimited { service: String },

    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    #[error("Unrecognized paper identifier: {input:?}")]
    InvalidIdentifier { input: String },

    #[error("Failed to decode {service} response: {message}")]
    Decode { service: String, message: String },
}

/// Coarse failure class used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    UpstreamUnavailable,
    InvalidIdentifier,
    Decode,
}

impl ErrorKind {
    /// Label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::InvalidIdentifier => "invalid_identifier",
            ErrorKind::Decode => "decode",
        }
    }
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::NotFound { .. } => ErrorKind::NotFound,
            SourceError::RateLimited { .. } => ErrorKind::RateLimited,
            SourceError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            SourceError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            SourceError::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub(crate) fn unavailable(service: &str, message: impl Into<String>) -> Self {
        SourceError::UpstreamUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(service: &str, message: impl Into<String>) -> Self {
        SourceError::Decode {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound { id } => AppError::PaperNotFound { id },
            SourceError::InvalidIdentifier { input } => AppError::InvalidIdentifier { id: input },
            other => AppError::Upstream {
                message: other.to_string(),
            },
        }
    }
}

/// Failure of a whole network build
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Invalid build budget: depth {max_depth}, nodes {max_nodes}")]
    InvalidBudget { max_depth: u32, max_nodes: u32 },
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        AppError::NetworkBuild {
            message: err.to_string(),
        }
    }
}

/// Failure of the ranking pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("Damping factor must be within [0, 1], got {0}")]
    InvalidDamping(f64),

    #[error("PageRank needs at least one iteration")]
    NoIterations,
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperweb_common::errors::ErrorCode;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SourceError::unavailable("s2", "boom").kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(SourceError::decode("s2", "bad json").kind().as_str(), "decode");
    }

    #[test]
    fn test_source_error_to_app_error() {
        let app: AppError = SourceError::NotFound { id: "P0".into() }.into();
        assert!(matches!(app, AppError::PaperNotFound { .. }));

        let app: AppError = SourceError::InvalidIdentifier { input: "a b".into() }.into();
        assert_eq!(app.code(), ErrorCode::PaperFetchFailed);

        let app: AppError = SourceError::RateLimited { service: "s2".into() }.into();
        assert!(matches!(app, AppError::Upstream { .. }));
    }

    #[test]
    fn test_build_error_to_app_error() {
        let app: AppError = BuildError::InvalidBudget { max_depth: 0, max_nodes: 1 }.into();
        assert_eq!(app.code(), ErrorCode::NetworkBuildFailed);
    }
}
