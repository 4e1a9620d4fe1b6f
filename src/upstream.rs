//! Outbound HTTP fetcher for upstream feeds
//!
//! Performs a single GET against an absolute URL, reads the whole body as raw
//! bytes regardless of declared content type or charset, and classifies the outcome into a
//! [`FetchResult`] or a [`FetchFailure`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client};
use url::Url;

use crate::error::FetchFailure;

/// Identifying header value sent with every upstream request
pub const USER_AGENT: &str = "occ-dashboard";

/// Default transport timeout for upstream requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a successful upstream fetch
///
/// Immutable once built; the cache hands out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub success: bool,
    pub status_code: u16,
    /// Upstream body exactly as received
    pub body: Bytes,
    /// The upstream's `content-type` header, if it sent one
    pub content_type: Option<String>,
}

/// A single upstream fetch strategy
///
/// Implemented once per upstream feed, so that URL and credential handling can
/// be tested independently of the cache.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self) -> Result<FetchResult, FetchFailure>;
}

/// Client for performing classified GET requests against upstream feeds
#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    client: Client,
}

impl UpstreamFetcher {
    /// Creates a fetcher with a transport timeout
    ///
    /// # Returns
    /// * `Err(reqwest::Error)` if the HTTP client (TLS backend) cannot be built
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches `url` once
    ///
    /// # Returns
    /// * `Ok(FetchResult)` - for any 2xx status
    /// * `Err(FetchFailure::Upstream)` - for other statuses, carrying the raw body
    /// * `Err(FetchFailure::Transport)` - if the request could not complete
    pub async fn fetch(&self, url: Url) -> Result<FetchResult, FetchFailure> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(FetchFailure::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(FetchResult {
            success: true,
            status_code: status.as_u16(),
            body,
            content_type,
        })
    }
}
