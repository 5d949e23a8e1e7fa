//! Routing engine response types.
//!
//! `Osrm*` types mirror the OSRM `route/v1` JSON. `EngineRoute` is the
//! engine-neutral form the rest of the crate consumes.

use serde::Deserialize;

use super::error::RoutingError;

/// OSRM response code for success.
pub const OSRM_OK: &str = "Ok";

/// OSRM response code the public demo server uses when throttling.
pub const OSRM_TOO_MANY_REQUESTS: &str = "TooManyRequests";

/// Top-level OSRM `route` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmRouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

/// One candidate route.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmRoute {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    /// Encoded polyline. Only used for drawing.
    #[serde(default)]
    pub geometry: Option<String>,
    pub legs: Vec<OsrmLeg>,
}

/// Route between two consecutive waypoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmLeg {
    pub distance: f64,
    pub duration: f64,
}

/// Driving distance and time for one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

/// A computed route over an ordered list of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRoute {
    /// One per consecutive waypoint pair, in order.
    pub legs: Vec<RouteLeg>,
    pub geometry: Option<String>,
}

impl EngineRoute {
    /// A route made of the given `(duration, distance)` legs.
    pub fn from_legs(legs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            legs: legs
                .into_iter()
                .map(|(duration, distance)| RouteLeg { distance, duration })
                .collect(),
            geometry: None,
        }
    }
}

impl TryFrom<OsrmRouteResponse> for EngineRoute {
    type Error = RoutingError;

    fn try_from(response: OsrmRouteResponse) -> Result<Self, Self::Error> {
        if response.code == OSRM_TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }
        if response.code != OSRM_OK {
            return Err(RoutingError::Engine {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingError::NoRoute)?;

        Ok(Self {
            legs: route
                .legs
                .iter()
                .map(|leg| RouteLeg {
                    distance: leg.distance,
                    duration: leg.duration,
                })
                .collect(),
            geometry: route.geometry,
        })
    }
}
