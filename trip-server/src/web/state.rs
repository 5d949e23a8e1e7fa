//! Application state for the web layer.

use std::sync::Arc;

use crate::geocode::PlaceSearch;
use crate::service::TripService;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// The running trip
    pub trips: TripService,

    /// Place search (cached in production)
    pub places: Arc<dyn PlaceSearch>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(trips: TripService, places: Arc<dyn PlaceSearch>) -> Self {
        Self { trips, places }
    }
}
