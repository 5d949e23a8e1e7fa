//! OSRM HTTP client.
//!
//! Calls the OSRM `route/v1` service for an ordered list of waypoints and
//! converts the answer to an [`EngineRoute`].

use futures::future::BoxFuture;

use crate::domain::Location;

use super::error::RoutingError;
use super::types::{EngineRoute, OsrmRouteResponse};

/// Default base URL: the public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default OSRM profile.
const DEFAULT_PROFILE: &str = "driving";

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 500;

/// Something that can compute a driving route through waypoints.
///
/// This abstraction allows the routing pipeline to be tested with a
/// scripted engine.
pub trait RoutingEngine: Send + Sync {
    /// Route through `waypoints` in order. The result has one leg per
    /// consecutive pair.
    fn route<'a>(
        &'a self,
        waypoints: &'a [Location],
    ) -> BoxFuture<'a, Result<EngineRoute, RoutingError>>;
}

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server
    pub base_url: String,
    /// Routing profile (e.g. "driving")
    pub profile: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Set a custom base URL (for self-hosted OSRM or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OSRM route API client.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    config: OsrmConfig,
}

impl OsrmClient {
    /// Create a new OSRM client with the given configuration.
    pub fn new(config: OsrmConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Build the request URL for `waypoints`.
    ///
    /// OSRM takes coordinates as `lng,lat` pairs separated by `;`.
    fn route_url(&self, waypoints: &[Location]) -> String {
        let coords = waypoints
            .iter()
            .map(|loc| format!("{:.6},{:.6}", loc.lng, loc.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    /// Compute a route through `waypoints`.
    pub async fn get_route(&self, waypoints: &[Location]) -> Result<EngineRoute, RoutingError> {
        let url = self.route_url(waypoints);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "polyline"),
                ("steps", "false"),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM reports routing failures (NoRoute, InvalidQuery, ...) with a
        // 400 status and a JSON body carrying the code, so parse before
        // falling back to the raw status.
        let parsed: OsrmRouteResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RoutingError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(MAX_ERROR_BODY).collect(),
                });
            }
            Err(e) => {
                return Err(RoutingError::Json {
                    message: e.to_string(),
                    body: Some(body.chars().take(MAX_ERROR_BODY).collect()),
                });
            }
        };

        EngineRoute::try_from(parsed)
    }
}

impl RoutingEngine for OsrmClient {
    fn route<'a>(
        &'a self,
        waypoints: &'a [Location],
    ) -> BoxFuture<'a, Result<EngineRoute, RoutingError>> {
        Box::pin(self.get_route(waypoints))
    }
}
