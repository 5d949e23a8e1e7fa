//! The trip aggregate.

use serde::{Deserialize, Serialize};

use super::{Day, DayId, Stop, day_color};

/// Default name of a freshly created trip.
pub const DEFAULT_TRIP_NAME: &str = "My Trip";

/// Unit distances are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Mi,
}

/// Per-trip preferences. Display and defaults only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSettings {
    /// Minutes.
    pub default_stop_duration: u32,
    pub distance_unit: DistanceUnit,
}

impl Default for TripSettings {
    fn default() -> Self {
        Self {
            default_stop_duration: 60,
            distance_unit: DistanceUnit::Km,
        }
    }
}

/// A multi-day itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Chronological order.
    pub days: Vec<Day>,
    #[serde(default)]
    pub settings: TripSettings,
}

/// The previous day's final stop, seen as the start of a later day.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritedStart {
    pub stop: Stop,
    pub from_day_index: usize,
}

/// Totals across every day that has route stats.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTotals {
    pub stops: usize,
    /// Seconds.
    pub driving_time: f64,
    /// Meters.
    pub driving_distance: f64,
    /// Minutes.
    pub activity_time: u64,
}

impl Trip {
    /// An empty trip with a fresh id and default settings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_TRIP_NAME.to_string(),
            description: None,
            days: Vec::new(),
            settings: TripSettings::default(),
        }
    }

    /// Position of a day in the itinerary.
    pub fn day_index(&self, day_id: &DayId) -> Option<usize> {
        self.days.iter().position(|d| &d.id == day_id)
    }

    /// Find a day by id.
    pub fn day(&self, day_id: &DayId) -> Option<&Day> {
        self.days.iter().find(|d| &d.id == day_id)
    }

    /// The inherited start of the day at `index`.
    ///
    /// `None` for the first day, or when the previous day has no stops.
    pub fn inherited_start_at(&self, index: usize) -> Option<InheritedStart> {
        let from_day_index = index.checked_sub(1)?;
        let prev = self.days.get(from_day_index)?;
        prev.last_stop().map(|stop| InheritedStart {
            stop: stop.clone(),
            from_day_index,
        })
    }

    /// Reassign every day's color from its current position.
    pub fn recolor_days(&mut self) {
        for (idx, day) in self.days.iter_mut().enumerate() {
            day.color = day_color(idx).to_string();
        }
    }

    /// Total number of stops across all days.
    pub fn stop_count(&self) -> usize {
        self.days.iter().map(|d| d.stops.len()).sum()
    }

    /// Sum the stats of every day that has them.
    pub fn totals(&self) -> TripTotals {
        self.days
            .iter()
            .filter_map(|d| d.stats.as_ref())
            .fold(TripTotals::default(), |mut acc, stats| {
                acc.stops += stats.stop_count;
                acc.driving_time += stats.total_driving_time;
                acc.driving_distance += stats.total_driving_distance;
                acc.activity_time = acc.activity_time.saturating_add(stats.total_activity_time);
                acc
            })
    }
}
