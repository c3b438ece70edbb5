//! Error types for PaperWeb services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request errors (1xxx)
    MissingPaperId,
    InvalidJson,
    ValidationError,

    // Upstream paper source errors (2xxx)
    PaperFetchFailed,

    // Network build errors (3xxx)
    NetworkBuildFailed,

    // Rate limiting (6xxx)
    RateLimited,

    // Cache collaborator errors (8xxx)
    SupabaseConfigMissing,
    CacheUnavailable,

    // Internal errors (9xxx)
    InternalServerError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::MissingPaperId => 1001,
            ErrorCode::InvalidJson => 1002,
            ErrorCode::ValidationError => 1003,

            ErrorCode::PaperFetchFailed => 2001,

            ErrorCode::NetworkBuildFailed => 3001,

            ErrorCode::RateLimited => 6001,

            ErrorCode::SupabaseConfigMissing => 8001,
            ErrorCode::CacheUnavailable => 8002,

            ErrorCode::InternalServerError => 9001,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request errors
    #[error("Paper ID is required")]
    MissingPaperId,

    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    // Paper source errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Unrecognized paper identifier: {id}")]
    InvalidIdentifier { id: String },

    #[error("Paper source unavailable: {message}")]
    Upstream { message: String },

    // Network build errors
    #[error("Network build failed: {message}")]
    NetworkBuild { message: String },


    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Cache collaborator errors
    #[error("Cache configuration missing: {message}")]
    CacheConfigMissing { message: String },

    #[error("Cache error: {message}")]
    CacheError { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingPaperId => ErrorCode::MissingPaperId,
            AppError::InvalidJson { .. } => ErrorCode::InvalidJson,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::PaperNotFound { .. } |
            AppError::InvalidIdentifier { .. } |
            AppError::Upstream { .. } => ErrorCode::PaperFetchFailed,
            AppError::NetworkBuild { .. } => ErrorCode::NetworkBuildFailed,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::CacheConfigMissing { .. } => ErrorCode::SupabaseConfigMissing,
            AppError::CacheError { .. } => ErrorCode::CacheUnavailable,
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => ErrorCode::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::MissingPaperId |
            AppError::InvalidJson { .. } |
            AppError::Validation { .. } |
            AppError::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::PaperNotFound { .. } => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::NetworkBuild { .. } |
            AppError::CacheConfigMissing { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::CacheError { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError {
            message: err.to_string()
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string()
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errors.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::PaperFetchFailed);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::SupabaseConfigMissing).unwrap();
        assert_eq!(json, "\"SUPABASE_CONFIG_MISSING\"");

        let json = serde_json::to_string(&ErrorCode::MissingPaperId).unwrap();
        assert_eq!(json, "\"MISSING_PAPER_ID\"");

        let json = serde_json::to_string(&ErrorCode::InternalServerError).unwrap();
        assert_eq!(json, "\"INTERNAL_SERVER_ERROR\"");
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "depth out of range".into(),
            field: Some("depth".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_build_errors() {
        let err = AppError::NetworkBuild { message: "invalid budget".into() };
        assert_eq!(err.code(), ErrorCode::NetworkBuildFailed);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_cache_config_missing() {
        let err = AppError::CacheConfigMissing { message: "rest_url".into() };
        assert_eq!(err.code(), ErrorCode::SupabaseConfigMissing);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
