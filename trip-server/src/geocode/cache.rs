//! Caching layer for place search.
//!
//! Users retype and refine the same queries while adding stops, and the
//! public Photon instance asks clients to keep request volume low. Search
//! results and reverse lookups are cached for a short TTL.
//!
//! Coordinates in keys are rounded so that nearby lookups share an entry:
//! search bias to about 1 km, reverse lookups to about 1 m.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{Location, PlaceDetails};

use super::client::PlaceSearch;
use super::error::GeocodeError;
use super::types::SearchResult;

/// (normalized query, rounded bias).
type SearchKey = (String, Option<(i64, i64)>);

/// Rounded coordinates.
type ReverseKey = (i64, i64);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct PlaceCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per kind of lookup.
    pub max_capacity: u64,
}

impl Default for PlaceCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 1000,
        }
    }
}

fn round(value: f64, scale: f64) -> i64 {
    (value * scale).round() as i64
}

fn search_key(query: &str, near: Option<Location>) -> SearchKey {
    (
        query.trim().to_lowercase(),
        near.map(|l| (round(l.lat, 100.0), round(l.lng, 100.0))),
    )
}

fn reverse_key(location: Location) -> ReverseKey {
    (round(location.lat, 1e5), round(location.lng, 1e5))
}

/// Place search with caching.
///
/// Wraps another [`PlaceSearch`] and caches successful answers. Errors are
/// not cached.
pub struct CachedPlaceSearch {
    inner: Arc<dyn PlaceSearch>,
    searches: MokaCache<SearchKey, Arc<Vec<SearchResult>>>,
    reverses: MokaCache<ReverseKey, Option<PlaceDetails>>,
}

impl CachedPlaceSearch {
    /// Create a new cached search over `inner`.
    pub fn new(inner: Arc<dyn PlaceSearch>, config: &PlaceCacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let reverses = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            searches,
            reverses,
        }
    }

    /// Search, using the cache if available.
    pub async fn search_places(
        &self,
        query: &str,
        near: Option<Location>,
    ) -> Result<Arc<Vec<SearchResult>>, GeocodeError> {
        let key = search_key(query, near);

        // Try cache first
        if let Some(cached) = self.searches.get(&key).await {
            trace!(query = %key.0, "place search cache hit");
            return Ok(cached);
        }

        let results = Arc::new(self.inner.search(query, near).await?);
        self.searches.insert(key, Arc::clone(&results)).await;

        Ok(results)
    }

    /// Reverse geocode, using the cache if available.
    pub async fn reverse_geocode(
        &self,
        location: Location,
    ) -> Result<Option<PlaceDetails>, GeocodeError> {
        let key = reverse_key(location);

        if let Some(cached) = self.reverses.get(&key).await {
            return Ok(cached);
        }

        let details = self.inner.reverse(location).await?;
        self.reverses.insert(key, details.clone()).await;

        Ok(details)
    }

    /// Number of cached searches (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.searches.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.searches.invalidate_all();
        self.reverses.invalidate_all();
    }
}

impl PlaceSearch for CachedPlaceSearch {
    fn search<'a>(
        &'a self,
        query: &'a str,
        near: Option<Location>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, GeocodeError>> {
        Box::pin(async move {
            let results = self.search_places(query, near).await?;
            Ok(Vec::clone(&results))
        })
    }

    fn reverse(
        &self,
        location: Location,
    ) -> BoxFuture<'_, Result<Option<PlaceDetails>, GeocodeError>> {
        Box::pin(self.reverse_geocode(location))
    }
}
