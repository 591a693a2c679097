//! HTTP client for the NHL stats API
//!
//! Wraps a reqwest client and a [`CacheStore`] so that every GET is made at
//! most once per distinct URL. Endpoint methods live in the `teams`, `games`
//! and `players` modules.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, Season, FIRST_SEASON};
use crate::cache::{CacheStore, FetchOptions};

/// Base URL for the NHL stats API
pub const NHL_API_BASE_URL: &str = "https://statsapi.web.nhl.com/api/v1";

/// Client for fetching NHL statistics through the disk cache
#[derive(Debug, Clone)]
pub struct NhlClient {
    http_client: Client,
    cache: CacheStore,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    /// Seasons searched when discovering a player's active years
    first_season: Season,
    last_season: Season,
}

impl NhlClient {
    /// Creates a client that caches responses in `cache`
    pub fn new(cache: CacheStore) -> Self {
        Self::with_client(Client::new(), cache)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(http_client: Client, cache: CacheStore) -> Self {
        Self {
            http_client,
            cache,
            base_url: NHL_API_BASE_URL.to_string(),
            first_season: Season(FIRST_SEASON),
            last_season: Season::current(),
        }
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Limits the seasons scanned by [`NhlClient::player_active_years`]
    pub fn with_season_range(mut self, first: Season, last: Season) -> Self {
        self.first_season = first;
        self.last_season = last;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn season_range(&self) -> impl Iterator<Item = Season> {
        (self.first_season.0..=self.last_season.0).map(Season)
    }

    /// Joins an endpoint path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetches `url` as JSON, through the cache
    ///
    /// The full URL is the cache key. The HTTP status is not checked: any
    /// body that parses as JSON is cached and returned.
    pub async fn request(&self, url: &str, options: FetchOptions) -> Result<Value, ApiError> {
        let value = self
            .cache
            .get_or_fetch_async(
                url,
                || async {
                    debug!("GET {url}");
                    let response = self.http_client.get(url).send().await?;
                    response.json::<Value>().await
                },
                options,
            )
            .await?;
        Ok(value)
    }

    /// Fetches an endpoint path relative to the base URL
    pub(crate) async fn get(&self, path: &str, options: FetchOptions) -> Result<Value, ApiError> {
        self.request(&self.url(path), options).await
    }
}
