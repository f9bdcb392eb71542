//! HTTP access to the listing and detail endpoints
//!
//! `JobClient` wraps a configured reqwest client. The pipeline consumes it
//! through the `JobApi` trait so tests can swap in an in-memory
//! implementation and exercise the worker pool without a network.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Errors that can occur while fetching from either endpoint
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode detail response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to build URL: {0}")]
    InvalidUrl(String),
}

/// A resolved job record: the authoritative title plus the raw response
/// bytes, kept for persistence.
#[derive(Debug, Clone)]
pub struct JobDetail {
    /// Title from the detail API (may differ from the listing-page title)
    pub title: String,
    /// Raw detail-API response body
    pub raw: Vec<u8>,
}

/// Detail-API response shape: `{ "job": { "title": ... } }`
#[derive(Debug, Deserialize)]
struct JobApiResponse {
    job: JobRecord,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    title: String,
}

/// Network operations the pipeline depends on
#[async_trait]
pub trait JobApi: Send + Sync + 'static {
    /// Fetch one listing page of search results as HTML.
    async fn fetch_listing(
        &self,
        query: &str,
        location: &str,
        page: u32,
    ) -> Result<String, FetchError>;

    /// Fetch the full job record for a lookup key.
    async fn fetch_detail(&self, key: &str) -> Result<JobDetail, FetchError>;
}

/// reqwest-backed client for the job site
pub struct JobClient {
    http: reqwest::Client,
    base_url: Url,
}

impl JobClient {
    /// Create a client for the given site.
    pub fn new(base_url: Url, config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self { http, base_url })
    }

    fn listing_url(&self, query: &str, location: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = self.join("search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("l", location)
            .append_pair("pn", &page.to_string())
            .append_pair("from", "pagination");
        Ok(url)
    }

    fn detail_url(&self, key: &str) -> Result<Url, FetchError> {
        let mut url = self.join("api/job")?;
        url.query_pairs_mut().append_pair("key", key);
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        let response = self.http.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl JobApi for JobClient {
    async fn fetch_listing(
        &self,
        query: &str,
        location: &str,
        page: u32,
    ) -> Result<String, FetchError> {
        let url = self.listing_url(query, location, page)?;
        tracing::debug!("Fetching listing page {}", url);
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }

    async fn fetch_detail(&self, key: &str) -> Result<JobDetail, FetchError> {
        let url = self.detail_url(key)?;
        tracing::debug!("Fetching job detail {}", url);
        let response = self.get(url).await?;
        let raw = response.bytes().await?.to_vec();

        let decoded: JobApiResponse = serde_json::from_slice(&raw)?;

        Ok(JobDetail {
            title: decoded.job.title,
            raw,
        })
    }
}
