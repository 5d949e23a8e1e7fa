//! Photon place search client.

use futures::future::BoxFuture;
use tracing::debug;

use crate::domain::{Location, PlaceDetails};

use super::error::GeocodeError;
use super::types::{PhotonResponse, SearchResult};

/// Default base URL: the public Photon instance run by komoot.
const DEFAULT_BASE_URL: &str = "https://photon.komoot.io";

/// Search and reverse geocoding, as used when adding stops.
///
/// This abstraction allows the web layer and the cache to be tested
/// without network access.
pub trait PlaceSearch: Send + Sync {
    /// Places matching `query`, optionally biased toward `near`.
    fn search<'a>(
        &'a self,
        query: &'a str,
        near: Option<Location>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, GeocodeError>>;

    /// Details of the place at `location`, if any.
    fn reverse(
        &self,
        location: Location,
    ) -> BoxFuture<'_, Result<Option<PlaceDetails>, GeocodeError>>;
}

/// Configuration for the Photon client.
#[derive(Debug, Clone)]
pub struct PhotonConfig {
    /// Base URL of the Photon server
    pub base_url: String,
    /// Maximum results per search
    pub limit: u32,
    /// Result language
    pub lang: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PhotonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            limit: 5,
            lang: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

impl PhotonConfig {
    /// Set a custom base URL (for self-hosted Photon or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the maximum number of results.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the result language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

/// Photon API client.
#[derive(Debug, Clone)]
pub struct PhotonClient {
    http: reqwest::Client,
    config: PhotonConfig,
}

impl PhotonClient {
    /// Create a new Photon client.
    pub fn new(config: PhotonConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a GET request and parse the feature collection.
    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<PhotonResponse, GeocodeError> {
        let response = self.http.get(self.url(path)).query(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GeocodeError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Search for places by free text.
    ///
    /// A blank query returns no results without a request.
    pub async fn search_places(
        &self,
        query: &str,
        near: Option<Location>,
    ) -> Result<Vec<SearchResult>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = vec![
            ("q", query.to_string()),
            ("limit", self.config.limit.to_string()),
            ("lang", self.config.lang.clone()),
        ];
        if let Some(near) = near {
            params.push(("lat", near.lat.to_string()));
            params.push(("lon", near.lng.to_string()));
        }

        let response = self.fetch("api/", &params).await?;
        debug!(query, results = response.features.len(), "place search");

        Ok(response
            .features
            .into_iter()
            .map(SearchResult::from)
            .collect())
    }

    /// Look up the place at a location.
    pub async fn reverse_geocode(
        &self,
        location: Location,
    ) -> Result<Option<PlaceDetails>, GeocodeError> {
        let params = [
            ("lat", location.lat.to_string()),
            ("lon", location.lng.to_string()),
            ("lang", self.config.lang.clone()),
        ];

        let response = self.fetch("reverse", &params).await?;

        Ok(response
            .features
            .into_iter()
            .next()
            .map(|feature| SearchResult::from(feature).place_details))
    }
}

impl PlaceSearch for PhotonClient {
    fn search<'a>(
        &'a self,
        query: &'a str,
        near: Option<Location>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, GeocodeError>> {
        Box::pin(self.search_places(query, near))
    }

    fn reverse(
        &self,
        location: Location,
    ) -> BoxFuture<'_, Result<Option<PlaceDetails>, GeocodeError>> {
        Box::pin(self.reverse_geocode(location))
    }
}
