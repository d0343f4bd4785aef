//! Coflnet SkyBlock API client.
//!
//! Backs both upstream contracts used by the price sources:
//! - [`AuctionFeed`]: active BIN auctions by tag, paged
//! - [`BazaarFeed`]: bazaar snapshot by product tag
//!
//! A 404 is a clean miss (unknown tag), not a failure.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::provider::auction::{AuctionFeed, AuctionListing};
use crate::provider::bazaar::{BazaarFeed, BazaarQuote};
use crate::provider::RateLimit;

use models::{CoflnetAuction, CoflnetBazaarSnapshot};

/// Default public API root.
pub const DEFAULT_BASE_URL: &str = "https://sky.coflnet.com";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const AUCTION_ID: &str = "AUCTION";
const BAZAAR_ID: &str = "BAZAAR";

/// Connection settings for the Coflnet API.
///
/// The rate limits are per HTTP request: one auction lookup may page
/// through several requests.
#[derive(Clone, Debug)]
pub struct CoflnetConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub auction_rate_limit: RateLimit,
    pub bazaar_rate_limit: RateLimit,
}

impl Default for CoflnetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            auction_rate_limit: RateLimit {
                requests_per_minute: 30,
                burst: 5,
            },
            bazaar_rate_limit: RateLimit {
                requests_per_minute: 60,
                burst: 10,
            },
        }
    }
}

/// HTTP client for the Coflnet endpoints.
///
/// # Example
///
/// ```ignore
/// let client = Arc::new(CoflnetClient::new(CoflnetConfig::default()));
/// let auction = AuctionProvider::new(client.clone());
/// let bazaar = BazaarProvider::new(client);
/// ```
pub struct CoflnetClient {
    client: Client,
    base_url: String,
}

impl CoflnetClient {
    pub fn new(config: CoflnetConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn auction_url(&self, tag: &str, page: u32) -> String {
        format!(
            "{}/api/auctions/tag/{}/active/bin?page={}",
            self.base_url,
            encode(tag),
            page
        )
    }

    pub fn bazaar_url(&self, tag: &str) -> String {
        format!("{}/api/bazaar/{}/snapshot", self.base_url, encode(tag))
    }

    /// GET a JSON document. `Ok(None)` for 404 or an empty body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        source_id: &str,
        url: &str,
    ) -> Result<Option<T>, MarketDataError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(source_id, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("{} request failed with status {}: {}", source_id, status, url);
            return Err(MarketDataError::from_status(source_id, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(source_id, e))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| MarketDataError::InvalidResponse {
                source_id: source_id.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl AuctionFeed for CoflnetClient {
    async fn fetch_page(
        &self,
        tag: &str,
        page: u32,
    ) -> Result<Vec<AuctionListing>, MarketDataError> {
        let url = self.auction_url(tag, page);
        let auctions: Option<Vec<CoflnetAuction>> = self.get_json(AUCTION_ID, &url).await?;

        Ok(auctions
            .unwrap_or_default()
            .into_iter()
            .map(AuctionListing::from)
            .collect())
    }
}

#[async_trait]
impl BazaarFeed for CoflnetClient {
    async fn snapshot(&self, tag: &str) -> Result<Option<BazaarQuote>, MarketDataError> {
        let url = self.bazaar_url(tag);
        let snapshot: Option<CoflnetBazaarSnapshot> = self.get_json(BAZAAR_ID, &url).await?;

        Ok(snapshot.and_then(CoflnetBazaarSnapshot::into_quote))
    }
}
