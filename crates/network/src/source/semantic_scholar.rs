//! Semantic Scholar Graph API client
//!
//! Primary paper source. arXiv-shaped lookups fall back to the arXiv Atom
//! API and OpenAlex work ids are turned into DOIs before the lookup.

use super::{
    http_client, status_error, transport_error, ArxivClient, IdentifierRules, OpenAlexClient, PaperLookup,
    PaperSource, RetryPolicy,
};
use crate::errors::SourceError;
use async_trait::async_trait;
use paperweb_common::config::SourceConfig;
use paperweb_common::metrics;
use paperweb_common::models::{PaperRecord, PaperRef};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "semantic_scholar";

/// Fields requested for every paper lookup
pub const PAPER_FIELDS: &str = "paperId,title,abstract,year,citationCount,authors,venue,url,openAccessPdf,\
fieldsOfStudy,externalIds,references.paperId,references.title,references.year,references.citationCount,\
citations.paperId,citations.title,citations.year,citations.citationCount";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<i32>,
    citation_count: Option<u64>,
    authors: Option<Vec<S2Author>>,
    venue: Option<String>,
    url: Option<String>,
    open_access_pdf: Option<S2Pdf>,
    fields_of_study: Option<Vec<String>>,
    external_ids: Option<S2ExternalIds>,
    references: Option<Vec<S2PaperRef>>,
    citations: Option<Vec<S2PaperRef>>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Pdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2PaperRef {
    paper_id: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    citation_count: Option<u64>,
}

impl S2PaperRef {
    fn into_ref(self) -> Option<PaperRef> {
        let id = self.paper_id.filter(|id| !id.is_empty())?;
        Some(PaperRef {
            id,
            title: self.title,
            year: self.year,
            citation_count: self.citation_count,
        })
    }
}

/// Semantic Scholar backed [`PaperSource`]
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    rules: IdentifierRules,
    openalex: Option<OpenAlexClient>,
    arxiv: Option<ArxivClient>,
}

impl SemanticScholarClient {
    /// Create a client with OpenAlex and arXiv fallbacks enabled
    pub fn new(config: &SourceConfig, retry: RetryPolicy) -> Result<Self, SourceError> {
        let client = http_client(config)?;

        Ok(Self {
            openalex: Some(OpenAlexClient::with_client(
                client.clone(),
                &config.openalex_url,
                &config.contact_email,
                retry.clone(),
            )),
            arxiv: Some(ArxivClient::with_client(client.clone(), &config.arxiv_url, retry.clone())),
            client,
            base_url: config.semantic_scholar_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
            retry,
            rules: IdentifierRules::default(),
        })
    }

    /// Disable the OpenAlex and arXiv fallbacks
    pub fn without_fallbacks(mut self) -> Self {
        self.openalex = None;
        self.arxiv = None;
        self
    }

    fn paper_url(&self, upstream_id: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::unavailable(SERVICE, format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| SourceError::unavailable(SERVICE, "Base URL cannot carry a path"))?
            .pop_if_empty()
            .push("paper")
            .push(upstream_id);

        url.query_pairs_mut().append_pair("fields", PAPER_FIELDS);
        Ok(url)
    }

    /// Fetch a paper by its upstream path id, with retries
    pub async fn fetch_paper(&self, upstream_id: &str) -> Result<PaperRecord, SourceError> {
        self.retry.run(SERVICE, || self.fetch_once(upstream_id)).await
    }

    async fn fetch_once(&self, upstream_id: &str) -> Result<PaperRecord, SourceError> {
        let mut request = self.client.get(self.paper_url(upstream_id)?);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(SERVICE, status, upstream_id));
        }
        metrics::record_upstream(SERVICE, "ok");

        let body = response.text().await.map_err(|e| transport_error(SERVICE, e))?;
        parse_paper(&body, upstream_id)
    }

    async fn openalex_doi(&self, work_id: &str) -> Option<String> {
        let openalex = self.openalex.as_ref()?;

        match openalex.find_doi(work_id).await {
            Ok(doi) => doi,
            Err(e) => {
                warn!(work_id, error = %e, "OpenAlex lookup failed, using work id verbatim");
                None
            }
        }
    }

    async fn arxiv_fallback(&self, arxiv_id: &str, primary: SourceError) -> Result<PaperRecord, SourceError> {
        let arxiv = match (&self.arxiv, &primary) {
            (_, SourceError::InvalidIdentifier { .. }) | (None, _) => return Err(primary),
            (Some(arxiv), _) => arxiv,
        };

        match arxiv.fetch(arxiv_id).await {
            Ok(record) => {
                info!(arxiv_id, primary_error = %primary, "Resolved paper through arXiv fallback");
                Ok(record)
            }
            Err(e) => {
                debug!(arxiv_id, error = %e, "arXiv fallback failed");
                Err(primary)
            }
        }
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    #[instrument(skip(self))]
    async fn resolve(&self, identifier: &str) -> Result<PaperRecord, SourceError> {
        let lookup = self.rules.classify(identifier)?;

        match &lookup {
            PaperLookup::Arxiv(arxiv_id) => match self.fetch_paper(&lookup.upstream_id()).await {
                Ok(record) => Ok(record),
                Err(primary) => self.arxiv_fallback(arxiv_id, primary).await,
            },
            PaperLookup::OpenAlex(work_id) => {
                let upstream_id = match self.openalex_doi(work_id).await {
                    Some(doi) => PaperLookup::Doi(doi).upstream_id(),
                    None => work_id.clone(),
                };
                self.fetch_paper(&upstream_id).await
            }
            PaperLookup::Doi(_) | PaperLookup::Native(_) => self.fetch_paper(&lookup.upstream_id()).await,
        }
    }

    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

/// Decode a Graph API paper body
pub(crate) fn parse_paper(body: &str, requested: &str) -> Result<PaperRecord, SourceError> {
    let paper: S2Paper = serde_json::from_str(body).map_err(|e| SourceError::decode(SERVICE, e.to_string()))?;

    let id = paper
        .paper_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SourceError::NotFound {
            id: requested.to_string(),
        })?;

    let refs = |list: Option<Vec<S2PaperRef>>| -> Vec<PaperRef> {
        list.unwrap_or_default().into_iter().filter_map(S2PaperRef::into_ref).collect()
    };

    Ok(PaperRecord {
        id,
        title: paper.title.unwrap_or_default(),
        abstract_text: paper.abstract_text.filter(|a| !a.trim().is_empty()),
        year: paper.year,
        citation_count: paper.citation_count.unwrap_or(0),
        authors: paper
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .collect(),
        venue: paper.venue.filter(|v| !v.trim().is_empty()),
        url: paper.url,
        pdf_url: paper.open_access_pdf.and_then(|pdf| pdf.url),
        doi: paper.external_ids.and_then(|ids| ids.doi),
        fields_of_study: paper.fields_of_study.unwrap_or_default(),
        references: refs(paper.references),
        citations: refs(paper.citations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    const PAPER: &str = r#"{
        "paperId": "204e3073870fae3d05bcbc2f6a8e263d9b72e776",
        "externalIds": {"DOI": "10.48550/arXiv.1706.03762", "ArXiv": "1706.03762", "CorpusId": 13756489},
        "url": "https://www.semanticscholar.org/paper/204e3073870fae3d05bcbc2f6a8e263d9b72e776",
        "title": "Attention is All you Need",
        "abstract": "The dominant sequence transduction models...",
        "venue": "Neural Information Processing Systems",
        "year": 2017,
        "citationCount": 120000,
        "openAccessPdf": null,
        "fieldsOfStudy": ["Computer Science"],
        "authors": [{"authorId": "40348417", "name": "Ashish Vaswani"}, {"authorId": null, "name": "Noam Shazeer"}],
        "references": [
            {"paperId": "R1", "title": "Neural Machine Translation", "year": 2014, "citationCount": 25000},
            {"paperId": null, "title": "Unindexed reference"},
            {"paperId": "R2", "title": null, "year": null, "citationCount": null}
        ],
        "citations": [
            {"paperId": "C1", "title": "BERT", "year": 2019, "citationCount": 90000}
        ]
    }"#;

    fn offline_client() -> SemanticScholarClient {
        let config = SourceConfig {
            semantic_scholar_url: "http://127.0.0.1:9/graph/v1".into(),
            arxiv_url: "http://127.0.0.1:9".into(),
            openalex_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        SemanticScholarClient::new(&config, RetryPolicy::none()).unwrap()
    }

    const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2301.07041v2</id>
    <published>2023-01-17T18:00:00Z</published>
    <title>Verifiable Fully Homomorphic
      Encryption</title>
    <summary>We study verifiable computation over encrypted data.</summary>
    <author><name>Alexander Viand</name></author>
    <link href="http://arxiv.org/abs/2301.07041v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2301.07041v2" rel="related" type="application/pdf"/>
    <category term="cs.CR" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    /// Client whose three upstreams all live on one local mock server
    fn client_for(server: &ServerGuard, retry: RetryPolicy) -> SemanticScholarClient {
        let config = SourceConfig {
            semantic_scholar_url: format!("{}/graph/v1", server.url()),
            arxiv_url: server.url(),
            openalex_url: server.url(),
            ..Default::default()
        };
        SemanticScholarClient::new(&config, retry).unwrap()
    }

    #[tokio::test]
    async fn test_arxiv_fallback_after_primary_retries() {
        let mut server = Server::new_async().await;

        let primary = server
            .mock("GET", "/graph/v1/paper/ARXIV:2301.07041")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;
        let feed = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded("id_list".into(), "2301.07041".into()))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(ARXIV_FEED)
            .expect(1)
            .create_async()
            .await;

        let retry = RetryPolicy::default().with_base_delay(Duration::from_millis(1));
        let record = client_for(&server, retry).resolve("arXiv:2301.07041").await.unwrap();

        primary.assert_async().await;
        feed.assert_async().await;

        assert_eq!(record.id, "ARXIV:2301.07041");
        assert_eq!(record.title, "Verifiable Fully Homomorphic Encryption");
        assert_eq!(record.citation_count, 0);
        assert!(record.references.is_empty());
        assert!(record.citations.is_empty());
        assert_eq!(record.venue.as_deref(), Some("arXiv"));
        assert_eq!(record.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2301.07041v2"));
    }

    #[tokio::test]
    async fn test_openalex_work_is_looked_up_by_doi() {
        let mut server = Server::new_async().await;

        let work = server
            .mock("GET", "/works/W2741809807")
            .match_query(Matcher::UrlEncoded("select".into(), "id,doi".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "https://openalex.org/W2741809807", "doi": "https://doi.org/10.7717/peerj.4375"}"#)
            .expect(1)
            .create_async()
            .await;
        let paper = server
            .mock("GET", "/graph/v1/paper/DOI:10.7717%2Fpeerj.4375")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PAPER)
            .expect(1)
            .create_async()
            .await;

        let record = client_for(&server, RetryPolicy::none()).resolve("W2741809807").await.unwrap();

        work.assert_async().await;
        paper.assert_async().await;
        assert_eq!(record.title, "Attention is All you Need");
        assert_eq!(record.references.len(), 2);
    }

    #[tokio::test]
    async fn test_openalex_failure_uses_work_id_verbatim() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/works/W2741809807")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let paper = server
            .mock("GET", "/graph/v1/paper/W2741809807")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(PAPER)
            .expect(1)
            .create_async()
            .await;

        let record = client_for(&server, RetryPolicy::none()).resolve("W2741809807").await.unwrap();

        paper.assert_async().await;
        assert_eq!(record.id, "204e3073870fae3d05bcbc2f6a8e263d9b72e776");
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let mut server = Server::new_async().await;

        let paper = server
            .mock("GET", "/graph/v1/paper/CorpusId:13756489")
            .match_query(Matcher::Any)
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body(PAPER)
            .expect(1)
            .create_async()
            .await;

        let config = SourceConfig {
            semantic_scholar_url: format!("{}/graph/v1", server.url()),
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let client = SemanticScholarClient::new(&config, RetryPolicy::none()).unwrap();

        client.resolve("CorpusId:13756489").await.unwrap();
        paper.assert_async().await;
    }

    #[test]
    fn test_parse_paper() {
        let record = parse_paper(PAPER, "ARXIV:1706.03762").unwrap();

        assert_eq!(record.id, "204e3073870fae3d05bcbc2f6a8e263d9b72e776");
        assert_eq!(record.title, "Attention is All you Need");
        assert_eq!(record.citation_count, 120000);
        assert_eq!(record.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(record.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
        assert_eq!(record.fields_of_study, vec!["Computer Science"]);
        assert!(record.pdf_url.is_none());
    }

    #[test]
    fn test_parse_paper_skips_unindexed_refs() {
        let record = parse_paper(PAPER, "P0").unwrap();

        let ids: Vec<_> = record.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
        assert_eq!(record.references[0].citation_count, Some(25000));
        assert!(record.references[1].title.is_none());
        assert_eq!(record.citations.len(), 1);
    }

    #[test]
    fn test_parse_paper_null_lists() {
        let body = r#"{"paperId": "P0", "title": "Lonely", "venue": "", "fieldsOfStudy": null, "references": null}"#;
        let record = parse_paper(body, "P0").unwrap();

        assert!(record.references.is_empty());
        assert!(record.citations.is_empty());
        assert!(record.fields_of_study.is_empty());
        assert!(record.venue.is_none());
    }

    #[test]
    fn test_parse_paper_without_id_is_not_found() {
        let err = parse_paper(r#"{"paperId": null}"#, "DOI:10.1/x").unwrap_err();
        assert_eq!(err, SourceError::NotFound { id: "DOI:10.1/x".into() });
    }

    #[test]
    fn test_parse_paper_malformed() {
        assert!(matches!(parse_paper("<html>", "P0"), Err(SourceError::Decode { .. })));
    }

    #[test]
    fn test_paper_url_encodes_doi() {
        let client = offline_client();
        let url = client.paper_url("DOI:10.1038/nature12373").unwrap();

        assert!(url.path().ends_with("/graph/v1/paper/DOI:10.1038%2Fnature12373"));
        assert!(url.query().unwrap_or_default().starts_with("fields=paperId"));
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_hits_network() {
        let err = offline_client().resolve("not an id").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn test_arxiv_fallback_failure_surfaces_primary_error() {
        let err = offline_client().resolve("arXiv:2301.07041").await.unwrap_err();

        match err {
            SourceError::UpstreamUnavailable { service, .. } => assert_eq!(service, SERVICE),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_key_detection() {
        assert!(!offline_client().has_api_key());

        let config = SourceConfig {
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let client = SemanticScholarClient::new(&config, RetryPolicy::none()).unwrap();
        assert!(client.has_api_key());
        assert_eq!(client.without_fallbacks().name(), SERVICE);
    }
}
