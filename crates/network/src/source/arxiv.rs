//! arXiv Atom API fallback for preprints the primary source has not indexed

use super::{http_client, normalize_whitespace, status_error, transport_error, RetryPolicy};
use crate::errors::SourceError;
use paperweb_common::config::SourceConfig;
use paperweb_common::metrics;
use paperweb_common::models::PaperRecord;
use serde::Deserialize;
use tracing::{debug, instrument};

const SERVICE: &str = "arxiv";

/// Venue reported for arXiv-only records
pub const ARXIV_VENUE: &str = "arXiv";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "doi", alias = "arxiv:doi", default)]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

/// Client for the arXiv export API
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ArxivClient {
    pub fn new(config: &SourceConfig, retry: RetryPolicy) -> Result<Self, SourceError> {
        Ok(Self::with_client(http_client(config)?, &config.arxiv_url, retry))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Fetch a single preprint by arXiv id
    #[instrument(skip(self))]
    pub async fn fetch(&self, arxiv_id: &str) -> Result<PaperRecord, SourceError> {
        self.retry.run(SERVICE, || self.fetch_once(arxiv_id)).await
    }

    async fn fetch_once(&self, arxiv_id: &str) -> Result<PaperRecord, SourceError> {
        let url = format!("{}/api/query", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("id_list", arxiv_id), ("max_results", "1")])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(SERVICE, status, arxiv_id));
        }
        metrics::record_upstream(SERVICE, "ok");

        let body = response.text().await.map_err(|e| transport_error(SERVICE, e))?;
        parse_feed(&body, arxiv_id)
    }
}

/// Decode an Atom feed into a paper record
pub(crate) fn parse_feed(xml: &str, arxiv_id: &str) -> Result<PaperRecord, SourceError> {
    let feed: AtomFeed = quick_xml::de::from_str(xml).map_err(|e| SourceError::decode(SERVICE, e.to_string()))?;

    // Unknown ids come back as an empty feed or a single error entry
    let entry = feed
        .entries
        .into_iter()
        .find(|e| !e.id.contains("/api/errors"))
        .ok_or_else(|| SourceError::NotFound {
            id: arxiv_id.to_string(),
        })?;

    debug!(arxiv_id, entry_id = %entry.id, "Decoded arXiv entry");
    Ok(entry_to_record(entry, arxiv_id))
}

fn entry_to_record(entry: AtomEntry, arxiv_id: &str) -> PaperRecord {
    let summary = normalize_whitespace(&entry.summary);
    let year = entry
        .published
        .as_deref()
        .and_then(|p| p.get(..4))
        .and_then(|y| y.parse().ok());

    let url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .map(|l| l.href.clone())
        .unwrap_or_else(|| entry.id.clone());

    let pdf_url = entry
        .links
        .iter()
        .find(|l| l.title.as_deref() == Some("pdf"))
        .map(|l| l.href.clone());

    let mut fields_of_study: Vec<String> = Vec::new();
    for category in entry.categories {
        if !fields_of_study.contains(&category.term) {
            fields_of_study.push(category.term);
        }
    }

    PaperRecord {
        id: format!("ARXIV:{}", arxiv_id),
        title: normalize_whitespace(&entry.title),
        abstract_text: (!summary.is_empty()).then_some(summary),
        year,
        citation_count: 0,
        authors: entry
            .authors
            .into_iter()
            .map(|a| normalize_whitespace(&a.name))
            .filter(|name| !name.is_empty())
            .collect(),
        venue: Some(ARXIV_VENUE.to_string()),
        url: Some(url),
        pdf_url,
        doi: entry.doi.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        fields_of_study,
        references: Vec::new(),
        citations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: id_list=1706.03762</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
      recurrent or convolutional neural networks.
    </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <arxiv:doi>10.48550/arXiv.1706.03762</arxiv:doi>
    <link title="doi" href="http://dx.doi.org/10.48550/arXiv.1706.03762" rel="related"/>
    <arxiv:comment>15 pages, 5 figures</arxiv:comment>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let record = parse_feed(FEED, "1706.03762").unwrap();

        assert_eq!(record.id, "ARXIV:1706.03762");
        assert_eq!(record.title, "Attention Is All You Need");
        assert!(record.abstract_text.unwrap().starts_with("The dominant sequence"));
        assert_eq!(record.year, Some(2017));
        assert_eq!(record.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(record.venue.as_deref(), Some(ARXIV_VENUE));
        assert_eq!(record.url.as_deref(), Some("http://arxiv.org/abs/1706.03762v7"));
        assert_eq!(record.pdf_url.as_deref(), Some("http://arxiv.org/pdf/1706.03762v7"));
        assert_eq!(record.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
        assert_eq!(record.fields_of_study, vec!["cs.CL", "cs.LG"]);
        assert_eq!(record.citation_count, 0);
        assert!(record.references.is_empty());
        assert!(record.citations.is_empty());
    }

    #[test]
    fn test_empty_feed_is_not_found() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title></feed>"#;
        assert!(matches!(parse_feed(xml, "9999.99999"), Err(SourceError::NotFound { .. })));
    }

    #[test]
    fn test_error_entry_is_not_found() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_bogus</id>
    <title>Error</title>
    <summary>incorrect id format for bogus</summary>
  </entry>
</feed>"#;
        assert!(matches!(parse_feed(xml, "bogus"), Err(SourceError::NotFound { .. })));
    }

    #[test]
    fn test_malformed_xml_is_decode_error() {
        assert!(matches!(
            parse_feed("<feed><entry>", "1706.03762"),
            Err(SourceError::Decode { .. })
        ));
    }
}
