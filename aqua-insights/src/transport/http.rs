//! REST transport for the assessment results endpoint
//!
//! `GET {base_uri}/result` with the selector flattened into query parameters.

use super::Transport;
use crate::models::{QuerySelector, ScoredRecord};
use aqua_common::verse_ref::book_number_to_id;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("aqua-insights/", env!("CARGO_PKG_VERSION"));

/// Failures talking to the remote endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("credential rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("remote returned HTTP {0}: {1}")]
    Api(u16, String),

    #[error("unexpected response body: {0}")]
    Parse(String),
}

impl From<TransportError> for aqua_common::Error {
    fn from(e: TransportError) -> Self {
        aqua_common::Error::Transport(e.to_string())
    }
}

/// Either `{"results": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultsBody {
    Wrapped { results: Vec<ScoredRecord> },
    Bare(Vec<ScoredRecord>),
}

impl ResultsBody {
    fn into_records(self) -> Vec<ScoredRecord> {
        match self {
            ResultsBody::Wrapped { results } => results,
            ResultsBody::Bare(results) => results,
        }
    }
}

pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Query parameters for one selector
    pub fn query_params(selector: &QuerySelector) -> Vec<(&'static str, String)> {
        let mut params = vec![("assessment_id", selector.assessment_id().to_string())];
        match selector {
            QuerySelector::Book { book_num, .. } => {
                let book = book_number_to_id(*book_num).unwrap_or_default();
                params.push(("book", book.to_string()));
            }
            QuerySelector::ChapterAggregate { .. } => {
                params.push(("aggregate", "chapter".to_string()));
            }
            QuerySelector::VerseDetail { verse, .. } => {
                params.push(("vref", verse.to_string()));
            }
        }
        params
    }

    async fn fetch(
        &self,
        base_uri: &str,
        selector: &QuerySelector,
        headers: &[(String, String)],
    ) -> Result<Vec<ScoredRecord>, TransportError> {
        let url = format!("{}/result", base_uri.trim_end_matches('/'));

        let mut request = self
            .http_client
            .get(&url)
            .query(&Self::query_params(selector));
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(url = %url, selector = %selector.cache_key(), "Requesting results");

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let parsed: ResultsBody =
            serde_json::from_str(&body).map_err(|e| TransportError::Parse(e.to_string()))?;

        Ok(parsed.into_records())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        base_uri: &str,
        selector: &QuerySelector,
        headers: &[(String, String)],
    ) -> aqua_common::Result<Vec<ScoredRecord>> {
        match self.fetch(base_uri, selector, headers).await {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(selector = %selector.cache_key(), error = %e, "Remote fetch failed");
                Err(e.into())
            }
        }
    }
}
