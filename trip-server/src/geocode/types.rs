//! Photon response types and their conversion to search results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Location, PlaceDetails};

/// Shown when a feature carries no usable address parts.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Address line of a result typed in as coordinates.
pub const CUSTOM_COORDINATES: &str = "Custom coordinates";

/// Photon GeoJSON feature collection.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotonResponse {
    #[serde(default)]
    pub features: Vec<PhotonFeature>,
}

/// One Photon result.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotonFeature {
    pub geometry: PhotonGeometry,
    #[serde(default)]
    pub properties: PhotonProperties,
}

/// GeoJSON point geometry. Coordinates are `[lng, lat]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotonGeometry {
    pub coordinates: [f64; 2],
}

/// The subset of Photon properties used for display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotonProperties {
    pub osm_id: Option<i64>,
    pub osm_type: Option<String>,
    pub name: Option<String>,
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub osm_key: Option<String>,
    pub osm_value: Option<String>,
}

impl PhotonProperties {
    /// Street line: "housenumber street", or just the street.
    fn street_line(&self) -> Option<String> {
        let street = self.street.as_deref()?;
        Some(match self.housenumber.as_deref() {
            Some(number) => format!("{number} {street}"),
            None => street.to_string(),
        })
    }
}

/// Human-readable address: street line, city (or state), country.
///
/// # Examples
///
/// ```
/// use trip_server::geocode::{PhotonProperties, format_address};
///
/// let props = PhotonProperties {
///     street: Some("Rue de Rivoli".into()),
///     housenumber: Some("99".into()),
///     city: Some("Paris".into()),
///     country: Some("France".into()),
///     ..Default::default()
/// };
/// assert_eq!(format_address(&props), "99 Rue de Rivoli, Paris, France");
/// assert_eq!(format_address(&Default::default()), "Unknown location");
/// ```
pub fn format_address(props: &PhotonProperties) -> String {
    let parts: Vec<String> = [
        props.street_line(),
        props.city.clone().or_else(|| props.state.clone()),
        props.country.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

/// A place offered to the user when adding a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub display_address: String,
    pub location: Location,
    pub place_details: PlaceDetails,
}

impl SearchResult {
    /// The single result offered when the query itself is a coordinate pair.
    pub fn from_coordinates(location: Location) -> Self {
        let name = location.to_string();
        Self {
            id: "coords".to_string(),
            name: name.clone(),
            display_address: CUSTOM_COORDINATES.to_string(),
            location,
            place_details: PlaceDetails {
                display_name: name,
                ..Default::default()
            },
        }
    }
}

impl From<PhotonFeature> for SearchResult {
    fn from(feature: PhotonFeature) -> Self {
        let props = feature.properties;
        let [lng, lat] = feature.geometry.coordinates;
        let display_address = format_address(&props);
        let name = props.name.clone().unwrap_or_else(|| display_address.clone());

        let id = format!(
            "{}-{}",
            props.osm_type.as_deref().unwrap_or("place"),
            props
                .osm_id
                .map_or_else(|| Uuid::new_v4().simple().to_string(), |id| id.to_string())
        );

        Self {
            id,
            place_details: PlaceDetails {
                display_name: name.clone(),
                address: props.street_line(),
                city: props.city,
                country: props.country,
                place_type: props.osm_value.or(props.kind),
                osm_id: props.osm_id.map(|id| id.to_string()),
            },
            name,
            display_address,
            location: Location { lat, lng },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_RESPONSE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.1204, 48.8049]},
                "properties": {
                    "osm_id": 1234,
                    "osm_type": "W",
                    "osm_key": "tourism",
                    "osm_value": "attraction",
                    "name": "Château de Versailles",
                    "street": "Place d'Armes",
                    "city": "Versailles",
                    "state": "Île-de-France",
                    "country": "France",
                    "type": "house"
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [10.0, 50.0]},
                "properties": {"state": "Bavaria", "country": "Germany", "type": "state"}
            }
        ]
    }"#;

    fn results() -> Vec<SearchResult> {
        let response: PhotonResponse = serde_json::from_str(SEARCH_RESPONSE).unwrap();
        response.features.into_iter().map(SearchResult::from).collect()
    }

    #[test]
    fn maps_named_feature() {
        let result = &results()[0];
        assert_eq!(result.id, "W-1234");
        assert_eq!(result.name, "Château de Versailles");
        assert_eq!(result.display_address, "Place d'Armes, Versailles, France");
        assert_eq!(result.location, Location { lat: 48.8049, lng: 2.1204 });
        assert_eq!(result.place_details.display_name, "Château de Versailles");
        assert_eq!(result.place_details.address.as_deref(), Some("Place d'Armes"));
        assert_eq!(result.place_details.place_type.as_deref(), Some("attraction"));
        assert_eq!(result.place_details.osm_id.as_deref(), Some("1234"));
    }

    #[test]
    fn unnamed_feature_falls_back_to_address() {
        let result = &results()[1];
        assert!(result.id.starts_with("place-"));
        assert_eq!(result.name, "Bavaria, Germany");
        assert_eq!(result.place_details.address, None);
        assert_eq!(result.place_details.place_type.as_deref(), Some("state"));
        assert_eq!(result.place_details.osm_id, None);
    }

    #[test]
    fn address_prefers_city_over_state() {
        let props = PhotonProperties {
            street: Some("Main St".into()),
            city: Some("Springfield".into()),
            state: Some("Illinois".into()),
            ..Default::default()
        };
        assert_eq!(format_address(&props), "Main St, Springfield");
    }

    #[test]
    fn housenumber_needs_street() {
        let props = PhotonProperties {
            housenumber: Some("12".into()),
            country: Some("Norway".into()),
            ..Default::default()
        };
        assert_eq!(format_address(&props), "Norway");
    }

    #[test]
    fn coordinate_result() {
        let result = SearchResult::from_coordinates(Location { lat: 48.85661, lng: 2.35222 });
        assert_eq!(result.id, "coords");
        assert_eq!(result.name, "48.8566, 2.3522");
        assert_eq!(result.display_address, CUSTOM_COORDINATES);
        assert_eq!(result.place_details.display_name, "48.8566, 2.3522");
    }

    #[test]
    fn empty_collection() {
        let response: PhotonResponse = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(response.features.is_empty());
    }
}
