//! Upstream feed catalogue
//!
//! Each proxied feed has a fixed route, cache key, TTL, fallback content type,
//! and upstream URL. [`UpstreamFeed`] is the fetch strategy for one of them; the
//! BODS SIRI-SX feed additionally requires an API key appended as a query
//! parameter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::FetchFailure;
use crate::upstream::{Fetch, FetchResult, UpstreamFetcher};

/// Fallback content type for JSON feeds
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Fallback content type for XML feeds
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

const WAZE_PARTNER_FEED_URL: &str = "https://www.waze.com/row-partnerhub-api/partners/11867436614/waze-feeds/4e8ef399-d6b9-4338-9840-7c2beacd235b?format=1";
const WAZE_TVT_URL: &str = "https://www.waze.com/row-partnerhub-api/feeds-tvt/?id=1713523744433";
const HIGHWAYS_NW_URL: &str =
    "https://m.highwaysengland.co.uk/feeds/rss/UnplannedEvents/North%20West.xml";
const BODS_SIRI_SX_URL: &str = "https://data.bus-data.dft.gov.uk/api/v1/siri-sx/";

/// The feeds this gateway proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Waze partner hub alerts and jams
    WazePartner,
    /// Waze traffic view (network health)
    WazeTvt,
    /// National Highways North West unplanned events RSS
    HighwaysNorthWest,
    /// Bus Open Data Service SIRI-SX disruptions
    BodsSiriSx,
}

impl FeedKind {
    pub const ALL: [FeedKind; 4] = [
        FeedKind::WazePartner,
        FeedKind::WazeTvt,
        FeedKind::HighwaysNorthWest,
        FeedKind::BodsSiriSx,
    ];

    /// Inbound route served by the gateway
    pub fn route(&self) -> &'static str {
        match self {
            FeedKind::WazePartner => "/api/waze/partner-feed",
            FeedKind::WazeTvt => "/api/waze/tvt",
            FeedKind::HighwaysNorthWest => "/api/highways-nw",
            FeedKind::BodsSiriSx => "/api/bods-siri-sx",
        }
    }

    pub fn cache_key(&self) -> &'static str {
        match self {
            FeedKind::WazePartner => "waze_partner_feed",
            FeedKind::WazeTvt => "waze_tvt",
            FeedKind::HighwaysNorthWest => "highways_nw",
            FeedKind::BodsSiriSx => "bods_siri_sx",
        }
    }

    pub fn default_ttl(&self) -> Duration {
        match self {
            FeedKind::BodsSiriSx => Duration::from_millis(10_000),
            _ => Duration::from_millis(15_000),
        }
    }

    /// Content type used when the upstream does not send one
    pub fn default_content_type(&self) -> &'static str {
        match self {
            FeedKind::WazePartner | FeedKind::WazeTvt => JSON_CONTENT_TYPE,
            FeedKind::HighwaysNorthWest | FeedKind::BodsSiriSx => XML_CONTENT_TYPE,
        }
    }

    /// Short description used in error bodies
    pub fn failure_label(&self) -> &'static str {
        match self {
            FeedKind::WazePartner => "Waze partner feed failed",
            FeedKind::WazeTvt => "Waze TVT failed",
            FeedKind::HighwaysNorthWest => "Highways feed failed",
            FeedKind::BodsSiriSx => "BODS fetch failed",
        }
    }

    pub fn upstream_url(&self) -> &'static str {
        match self {
            FeedKind::WazePartner => WAZE_PARTNER_FEED_URL,
            FeedKind::WazeTvt => WAZE_TVT_URL,
            FeedKind::HighwaysNorthWest => HIGHWAYS_NW_URL,
            FeedKind::BodsSiriSx => BODS_SIRI_SX_URL,
        }
    }

    /// Whether the feed needs the BODS API key
    pub fn requires_credential(&self) -> bool {
        matches!(self, FeedKind::BodsSiriSx)
    }
}

/// A proxied feed: routing and caching metadata plus its fetch strategy
pub trait Feed: Fetch {
    fn kind(&self) -> FeedKind;

    fn ttl(&self) -> Duration {
        self.kind().default_ttl()
    }
}

/// Fetch strategy for one upstream feed
#[derive(Debug, Clone)]
pub struct UpstreamFeed {
    kind: FeedKind,
    url: String,
    ttl: Duration,
    credential: Option<SecretString>,
    fetcher: UpstreamFetcher,
}

impl UpstreamFeed {
    /// Creates a feed pointed at its production upstream
    pub fn new(kind: FeedKind, fetcher: UpstreamFetcher) -> Self {
        Self {
            kind,
            url: kind.upstream_url().to_string(),
            ttl: kind.default_ttl(),
            credential: None,
            fetcher,
        }
    }

    /// Points the feed at a different upstream URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the API key appended to credentialed feeds
    pub fn with_credential(mut self, credential: Option<SecretString>) -> Self {
        self.credential = credential;
        self
    }

    /// Builds the outbound URL, appending the API key when the feed needs one
    ///
    /// # Returns
    /// * `Err(FetchFailure::Configuration)` - the feed needs a key and none is set
    pub fn request_url(&self) -> Result<Url, FetchFailure> {
        let invalid = |e: url::ParseError| {
            FetchFailure::configuration(format!(
                "Invalid upstream URL for {}: {}",
                self.kind.cache_key(),
                e
            ))
        };

        if !self.kind.requires_credential() {
            return Url::parse(&self.url).map_err(invalid);
        }

        let key = self
            .credential
            .as_ref()
            .map(|secret| secret.expose_secret())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FetchFailure::configuration("Missing BODS_API_KEY"))?;

        Url::parse_with_params(&self.url, &[("api_key", key)]).map_err(invalid)
    }
}

#[async_trait]
impl Fetch for UpstreamFeed {
    async fn fetch(&self) -> Result<FetchResult, FetchFailure> {
        let url = self.request_url()?;
        self.fetcher.fetch(url).await
    }
}

impl Feed for UpstreamFeed {
    fn kind(&self) -> FeedKind {
        self.kind
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Builds every proxied feed from process configuration
///
/// All feeds share one HTTP client configured with the upstream timeout.
pub fn build_feeds(config: &GatewayConfig) -> Result<Vec<Arc<dyn Feed>>, reqwest::Error> {
    let fetcher = UpstreamFetcher::new(config.upstream_timeout)?;
    let feeds = FeedKind::ALL
        .iter()
        .map(|&kind| {
            let mut feed = UpstreamFeed::new(kind, fetcher.clone());
            if kind.requires_credential() {
                feed = feed.with_credential(config.bods_api_key.clone());
            }
            Arc::new(feed) as Arc<dyn Feed>
        })
        .collect();
    Ok(feeds)
}
