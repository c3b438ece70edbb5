//! Paper records as returned by the bibliographic sources

use serde::{Deserialize, Serialize};

/// Minimal reference to a paper as listed in another paper's
/// reference or citation list. Not guaranteed to be resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRef {
    /// Provider-native paper ID
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
}

impl PaperRef {
    /// Reference carrying only an ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            year: None,
            citation_count: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A fully resolved paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    /// Provider-native ID, stable within a build
    pub id: String,

    /// Paper title
    pub title: String,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Number of citing papers reported by the provider
    #[serde(default)]
    pub citation_count: u64,

    /// Author names in byline order
    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Open access PDF link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default)]
    pub fields_of_study: Vec<String>,

    /// Papers this paper cites
    #[serde(default)]
    pub references: Vec<PaperRef>,

    /// Papers citing this paper
    #[serde(default)]
    pub citations: Vec<PaperRef>,
}

impl PaperRecord {
    /// Create a record with only an ID and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_references(mut self, references: Vec<PaperRef>) -> Self {
        self.references = references;
        self
    }

    pub fn with_citations(mut self, citations: Vec<PaperRef>) -> Self {
        self.citations = citations;
        self
    }
}
