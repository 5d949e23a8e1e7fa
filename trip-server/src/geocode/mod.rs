//! Place search and reverse geocoding.
//!
//! Backed by Photon (OpenStreetMap data). Input that already looks like
//! coordinates never reaches the search service; see
//! [`parse_coordinates`](crate::domain::parse_coordinates).

mod cache;
mod client;
mod error;
mod types;

pub use cache::{CachedPlaceSearch, PlaceCacheConfig};
pub use client::{PhotonClient, PhotonConfig, PlaceSearch};
pub use error::GeocodeError;
pub use types::{
    CUSTOM_COORDINATES, PhotonFeature, PhotonGeometry, PhotonProperties, PhotonResponse,
    SearchResult, UNKNOWN_LOCATION, format_address,
};
