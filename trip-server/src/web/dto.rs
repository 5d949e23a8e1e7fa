//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{DayId, InheritedStart, Location, Stop, StopId};
use crate::geocode::SearchResult;
use crate::service::TripView;
use crate::store::Direction;

/// Request to add a day.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDayRequest {
    /// Insert after this day (defaults to the end)
    pub after_day_id: Option<DayId>,
}

/// Request to rename the trip.
#[derive(Debug, Deserialize)]
pub struct RenameTripRequest {
    pub name: String,
}

/// Request to reorder a stop within its day.
#[derive(Debug, Deserialize)]
pub struct MoveStopRequest {
    pub direction: Direction,
}

/// Request to move a stop to the end of another day.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStopRequest {
    pub to_day_id: DayId,
}

/// Request to relocate a stop, as when its marker is dragged.
#[derive(Debug, Deserialize)]
pub struct RelocateStopRequest {
    pub location: Location,
}

/// Query for place search.
#[derive(Debug, Deserialize)]
pub struct PlaceSearchQuery {
    /// Free text, or a coordinate pair
    pub q: String,

    /// Bias results toward this latitude (requires `lng`)
    pub lat: Option<f64>,

    /// Bias results toward this longitude (requires `lat`)
    pub lng: Option<f64>,
}

impl PlaceSearchQuery {
    /// The bias point, if both coordinates were given.
    pub fn near(&self) -> Option<Location> {
        Some(Location {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

/// Query for reverse geocoding.
#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Place search results.
#[derive(Debug, Serialize)]
pub struct PlaceSearchResponse {
    pub results: Vec<SearchResult>,
}

/// Response to adding a day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDayResponse {
    pub day_id: DayId,

    #[serde(flatten)]
    pub view: TripView,
}

/// Response to adding a stop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStopResponse {
    /// `None` if the day does not exist
    pub stop_id: Option<StopId>,

    #[serde(flatten)]
    pub view: TripView,
}

/// The stop a day starts from, carried over from the previous day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedStartResponse {
    pub stop: Stop,
    pub from_day_index: usize,
}

impl From<InheritedStart> for InheritedStartResponse {
    fn from(start: InheritedStart) -> Self {
        Self {
            stop: start.stop,
            from_day_index: start.from_day_index,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
