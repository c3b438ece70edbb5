//! PaperWeb Common Library
//!
//! Shared code for the PaperWeb crates including:
//! - Citation network data model
//! - Error types and handling
//! - Configuration management
//! - Network cache backends
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use cache::{network_key, NetworkCache};
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
