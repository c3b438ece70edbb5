//! OpenAlex work lookup, used to turn OpenAlex work ids into DOIs

use super::{http_client, status_error, transport_error, RetryPolicy};
use crate::errors::SourceError;
use paperweb_common::config::SourceConfig;
use paperweb_common::metrics;
use serde::Deserialize;
use tracing::instrument;

const SERVICE: &str = "openalex";

#[derive(Debug, Deserialize)]
struct OpenAlexWork {
    #[serde(default)]
    doi: Option<String>,
}

/// Client for the OpenAlex works API
pub struct OpenAlexClient {
    client: reqwest::Client,
    base_url: String,
    contact_email: String,
    retry: RetryPolicy,
}

impl OpenAlexClient {
    pub fn new(config: &SourceConfig, retry: RetryPolicy) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            http_client(config)?,
            &config.openalex_url,
            &config.contact_email,
            retry,
        ))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, contact_email: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            contact_email: contact_email.to_string(),
            retry,
        }
    }

    /// DOI of an OpenAlex work, if it has one
    #[instrument(skip(self))]
    pub async fn find_doi(&self, work_id: &str) -> Result<Option<String>, SourceError> {
        self.retry.run(SERVICE, || self.find_doi_once(work_id)).await
    }

    async fn find_doi_once(&self, work_id: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/works/{}", self.base_url, work_id);

        // mailto puts us in the polite pool
        let response = self
            .client
            .get(&url)
            .query(&[("select", "id,doi"), ("mailto", self.contact_email.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(SERVICE, status, work_id));
        }
        metrics::record_upstream(SERVICE, "ok");

        let body = response.text().await.map_err(|e| transport_error(SERVICE, e))?;
        parse_work(&body)
    }
}

/// Extract a bare DOI from an OpenAlex work body
pub(crate) fn parse_work(body: &str) -> Result<Option<String>, SourceError> {
    let work: OpenAlexWork = serde_json::from_str(body).map_err(|e| SourceError::decode(SERVICE, e.to_string()))?;

    Ok(work.doi.as_deref().map(bare_doi).filter(|d| !d.is_empty()))
}

/// OpenAlex reports DOIs as `https://doi.org/<doi>`
fn bare_doi(doi: &str) -> String {
    doi.trim()
        .trim_start_matches("https://doi.org/")
        .trim_start_matches("http://doi.org/")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_work_with_doi() {
        let body = r#"{"id": "https://openalex.org/W2741809807", "doi": "https://doi.org/10.7717/peerj.4375"}"#;
        assert_eq!(parse_work(body).unwrap().as_deref(), Some("10.7717/peerj.4375"));
    }

    #[test]
    fn test_parse_work_without_doi() {
        assert_eq!(parse_work(r#"{"id": "https://openalex.org/W1", "doi": null}"#).unwrap(), None);
        assert_eq!(parse_work(r#"{"id": "https://openalex.org/W1"}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_work_malformed() {
        assert!(matches!(parse_work("not json"), Err(SourceError::Decode { .. })));
    }
}
