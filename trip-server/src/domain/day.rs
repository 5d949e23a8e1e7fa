//! Days and their derived route data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DayId, Stop, StopId};

/// Palette days are colored from, by position in the trip.
pub const DAY_COLORS: [&str; 8] = [
    "#3B82F6", // blue
    "#10B981", // emerald
    "#F59E0B", // amber
    "#EF4444", // red
    "#8B5CF6", // violet
    "#EC4899", // pink
    "#06B6D4", // cyan
    "#84CC16", // lime
];

/// Color for the day at `index` in the trip. Wraps around the palette.
///
/// # Examples
///
/// ```
/// use trip_server::domain::day_color;
///
/// assert_eq!(day_color(0), "#3B82F6");
/// assert_eq!(day_color(8), "#3B82F6");
/// ```
pub fn day_color(index: usize) -> &'static str {
    DAY_COLORS[index % DAY_COLORS.len()]
}

/// Stop id used as `from_stop_id` for the leg leaving an inherited start.
pub const INHERITED_START_ID: &str = "inherited-start";

/// The driving leg between two consecutive waypoints of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub from_stop_id: StopId,
    pub to_stop_id: StopId,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

impl RouteSegment {
    /// Whether this leg starts at the previous day's final stop.
    pub fn starts_inherited(&self) -> bool {
        self.from_stop_id.as_str() == INHERITED_START_ID
    }
}

/// Summary of a day's computed route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    /// Seconds.
    pub total_driving_time: f64,
    /// Meters.
    pub total_driving_distance: f64,
    /// Minutes, summed over the day's own stops.
    pub total_activity_time: u64,
    pub stop_count: usize,
}

/// One day of the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: DayId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Visiting order.
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub route_segments: Vec<RouteSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DayStats>,
}

fn visible_by_default() -> bool {
    true
}

impl Day {
    /// Create an empty, visible day colored for position `index`.
    pub fn new(id: DayId, index: usize, date: NaiveDate) -> Self {
        Self {
            id,
            date,
            name: None,
            stops: Vec::new(),
            is_visible: true,
            color: day_color(index).to_string(),
            route_segments: Vec::new(),
            stats: None,
        }
    }

    /// Find a stop by id.
    pub fn stop(&self, stop_id: &StopId) -> Option<&Stop> {
        self.stops.iter().find(|s| &s.id == stop_id)
    }

    /// Position of a stop in the visiting order.
    pub fn stop_index(&self, stop_id: &StopId) -> Option<usize> {
        self.stops.iter().position(|s| &s.id == stop_id)
    }

    /// The final stop of the day, which the next day inherits as its start.
    pub fn last_stop(&self) -> Option<&Stop> {
        self.stops.last()
    }

    /// The computed segment arriving at `stop_id`, if any.
    pub fn segment_to(&self, stop_id: &StopId) -> Option<&RouteSegment> {
        self.route_segments.iter().find(|s| &s.to_stop_id == stop_id)
    }

    /// Whether route data is present.
    pub fn has_route(&self) -> bool {
        self.stats.is_some()
    }
}
