//! In-memory paper source for testing

use super::PaperSource;
use crate::errors::SourceError;
use async_trait::async_trait;
use paperweb_common::models::PaperRecord;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Paper source serving a fixed set of records
#[derive(Default)]
pub struct MockPaperSource {
    papers: HashMap<String, PaperRecord>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockPaperSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paper(mut self, record: PaperRecord) -> Self {
        self.papers.insert(record.id.clone(), record);
        self
    }

    /// Make lookups of `id` fail as if the upstream were down
    pub fn with_failure(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Identifiers resolved so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaperSource for MockPaperSource {
    async fn resolve(&self, identifier: &str) -> Result<PaperRecord, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(identifier.to_string());
        }

        if identifier.trim().is_empty() || identifier.contains(char::is_whitespace) {
            return Err(SourceError::InvalidIdentifier {
                input: identifier.to_string(),
            });
        }

        if self.failing.contains(identifier) {
            return Err(SourceError::unavailable("mock", "simulated outage"));
        }

        self.papers
            .get(identifier)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                id: identifier.to_string(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockPaperSource::new()
            .with_paper(PaperRecord::new("P0", "Root"))
            .with_failure("R2");

        assert_eq!(source.resolve("P0").await.unwrap().title, "Root");
        assert!(matches!(source.resolve("R2").await, Err(SourceError::UpstreamUnavailable { .. })));
        assert!(matches!(source.resolve("R9").await, Err(SourceError::NotFound { .. })));
        assert!(matches!(source.resolve("a b").await, Err(SourceError::InvalidIdentifier { .. })));
        assert_eq!(source.calls(), vec!["P0", "R2", "R9", "a b"]);
    }
}
