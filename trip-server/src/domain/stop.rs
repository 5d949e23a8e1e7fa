//! Stops: the visited places within a day.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Location, StopId};

/// What kind of place a stop is.
///
/// Purely informational: nothing in the store enforces that a day starts
/// with `Start` or ends with `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    Start,
    #[default]
    Waypoint,
    End,
    Accommodation,
    Activity,
    Restaurant,
    GasStation,
    RestStop,
}

/// Descriptive data about a place, as returned by place search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<String>,
}

/// A single stop in a day's itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_details: Option<PlaceDetails>,
    /// Locked stops cannot be dragged to a new location.
    #[serde(default)]
    pub is_locked: bool,
    /// Minutes spent at the stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", default)]
    pub stop_type: StopType,
}

/// Default name for stops added without one.
pub const DEFAULT_STOP_NAME: &str = "New Stop";

/// Fields supplied when adding a stop. Anything left out takes a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDraft {
    pub name: Option<String>,
    pub location: Option<Location>,
    pub place_details: Option<PlaceDetails>,
    pub is_locked: Option<bool>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
    #[serde(rename = "type")]
    pub stop_type: Option<StopType>,
}

impl StopDraft {
    /// A draft at the given location with everything else defaulted.
    pub fn at(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    /// Set the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stop type.
    pub fn with_type(mut self, stop_type: StopType) -> Self {
        self.stop_type = Some(stop_type);
        self
    }

    /// Set the time spent at the stop, in minutes.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }

    /// Mark the stop as locked.
    pub fn locked(mut self) -> Self {
        self.is_locked = Some(true);
        self
    }

    /// Materialize the stop with the given id.
    pub fn into_stop(self, id: StopId) -> Stop {
        Stop {
            id,
            name: self.name.unwrap_or_else(|| DEFAULT_STOP_NAME.to_string()),
            location: self.location.unwrap_or_default(),
            place_details: self.place_details,
            is_locked: self.is_locked.unwrap_or(false),
            duration: self.duration,
            notes: self.notes,
            stop_type: self.stop_type.unwrap_or_default(),
        }
    }
}

/// A partial update merged into an existing stop.
///
/// For the optional stop fields, an absent key leaves the value alone while
/// an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPatch {
    pub name: Option<String>,
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "present")]
    pub place_details: Option<Option<PlaceDetails>>,
    pub is_locked: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub duration: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(rename = "type")]
    pub stop_type: Option<StopType>,
}

impl StopPatch {
    /// Merge the patch into `stop`. The stop's id is never changed.
    pub fn apply(&self, stop: &mut Stop) {
        if let Some(name) = &self.name {
            stop.name = name.clone();
        }
        if let Some(location) = self.location {
            stop.location = location;
        }
        if let Some(details) = &self.place_details {
            stop.place_details = details.clone();
        }
        if let Some(locked) = self.is_locked {
            stop.is_locked = locked;
        }
        if let Some(duration) = self.duration {
            stop.duration = duration;
        }
        if let Some(notes) = &self.notes {
            stop.notes = notes.clone();
        }
        if let Some(stop_type) = self.stop_type {
            stop.stop_type = stop_type;
        }
    }
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
