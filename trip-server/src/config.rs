//! Server configuration.
//!
//! Every setting has a default and can be overridden by an environment
//! variable:
//!
//! | Variable | Default |
//! |---|---|
//! | `TRIP_BIND_ADDR` | `127.0.0.1:3000` |
//! | `TRIP_SNAPSHOT_PATH` | `data/trip.json` |
//! | `OSRM_BASE_URL` | `https://router.project-osrm.org` |
//! | `OSRM_PROFILE` | `driving` |
//! | `PHOTON_BASE_URL` | `https://photon.komoot.io` |
//! | `ROUTE_MIN_DELAY_MS` | `400` |
//! | `ROUTE_BACKOFF_MS` | `3000` |
//! | `ROUTE_DEBOUNCE_MS` | `500` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::geocode::{PhotonConfig, PlaceCacheConfig};
use crate::routing::{DEFAULT_DEBOUNCE, OsrmConfig, QueueConfig};

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value {value:?} for {key}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Where the trip snapshot is kept between runs
    pub snapshot_path: PathBuf,
    pub osrm: OsrmConfig,
    pub photon: PhotonConfig,
    pub place_cache: PlaceCacheConfig,
    /// Route job pacing
    pub queue: QueueConfig,
    /// Quiet period before a changed day is routed
    pub debounce: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            snapshot_path: PathBuf::from("data/trip.json"),
            osrm: OsrmConfig::default(),
            photon: PhotonConfig::default(),
            place_cache: PlaceCacheConfig::default(),
            queue: QueueConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = parse(&get, "TRIP_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(path) = get("TRIP_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(url) = get("OSRM_BASE_URL") {
            config.osrm = config.osrm.with_base_url(url);
        }
        if let Some(profile) = get("OSRM_PROFILE") {
            config.osrm = config.osrm.with_profile(profile);
        }
        if let Some(url) = get("PHOTON_BASE_URL") {
            config.photon = config.photon.with_base_url(url);
        }
        if let Some(ms) = parse::<u64>(&get, "ROUTE_MIN_DELAY_MS")? {
            config.queue = config.queue.with_min_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = parse::<u64>(&get, "ROUTE_BACKOFF_MS")? {
            config.queue = config
                .queue
                .with_rate_limit_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = parse::<u64>(&get, "ROUTE_DEBOUNCE_MS")? {
            config.debounce = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Override the snapshot location.
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = get(key) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::Invalid {
            key,
            value,
            message: e.to_string(),
        }),
    }
}
