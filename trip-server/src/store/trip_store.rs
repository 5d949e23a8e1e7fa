//! The trip store: sole owner and mutator of the current `Trip`.
//!
//! Every command builds the next `Trip` value and swaps it in whole, so a
//! snapshot handed out by [`TripStore::trip`] never changes underneath its
//! holder. Commands naming an unknown day or stop leave the state untouched
//! and report `false`/`None`: ids come from UI events on possibly stale
//! snapshots, so they are absorbed rather than surfaced.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    Day, DayId, DayStats, InheritedStart, Location, RouteSegment, StopDraft, StopId, StopPatch,
    Trip, TripTotals,
};

/// Direction for reordering a stop within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Owns the current trip and the selected day.
#[derive(Debug, Clone)]
pub struct TripStore {
    trip: Arc<Trip>,
    selected_day_id: Option<DayId>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl Default for TripStore {
    fn default() -> Self {
        Self::new(Trip::new(Uuid::new_v4().to_string()))
    }
}

impl TripStore {
    /// Create a store over an existing trip, selecting its first day.
    ///
    /// Day colors are re-derived from position.
    pub fn new(mut trip: Trip) -> Self {
        trip.recolor_days();
        let selected_day_id = trip.days.first().map(|d| d.id.clone());
        Self {
            trip: Arc::new(trip),
            selected_day_id,
            today: local_today,
        }
    }

    /// Override the date source used for new days.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// The current trip snapshot.
    pub fn trip(&self) -> &Arc<Trip> {
        &self.trip
    }

    /// Id of the selected day, if any.
    pub fn selected_day_id(&self) -> Option<&DayId> {
        self.selected_day_id.as_ref()
    }

    /// The selected day, if any.
    pub fn selected_day(&self) -> Option<&Day> {
        self.selected_day_id
            .as_ref()
            .and_then(|id| self.trip.day(id))
    }

    /// Build the next trip from a copy of the current one.
    ///
    /// The copy replaces the current trip only if `f` reports a change.
    fn update(&mut self, f: impl FnOnce(&mut Trip) -> bool) -> bool {
        let mut next = Trip::clone(&self.trip);
        let changed = f(&mut next);
        if changed {
            self.trip = Arc::new(next);
        }
        changed
    }

    /// Apply `f` to one day of the next trip. No-op for an unknown day.
    fn update_day(&mut self, day_id: &DayId, f: impl FnOnce(&mut Day) -> bool) -> bool {
        self.update(|trip| {
            trip.days
                .iter_mut()
                .find(|d| &d.id == day_id)
                .is_some_and(f)
        })
    }

    /// Insert a new empty day after `after`, or at the end if `after` is
    /// `None` or unknown. Selects and returns the new day.
    pub fn add_day(&mut self, after: Option<&DayId>) -> DayId {
        let id = DayId::generate();
        let today = (self.today)();

        self.update(|trip| {
            let insert_at = after
                .and_then(|a| trip.day_index(a))
                .map_or(trip.days.len(), |idx| idx + 1);
            let offset = trip.days.len() as u64;
            let date = today.checked_add_days(Days::new(offset)).unwrap_or(today);

            trip.days.insert(insert_at, Day::new(id.clone(), insert_at, date));
            trip.recolor_days();
            true
        });

        debug!(day = %id, "added day");
        self.selected_day_id = Some(id.clone());
        id
    }

    /// Remove a day and all its stops. Clears the selection if it pointed
    /// at the removed day.
    pub fn remove_day(&mut self, day_id: &DayId) -> bool {
        let removed = self.update(|trip| {
            let Some(idx) = trip.day_index(day_id) else {
                return false;
            };
            trip.days.remove(idx);
            trip.recolor_days();
            true
        });

        if removed && self.selected_day_id.as_ref() == Some(day_id) {
            self.selected_day_id = None;
        }
        removed
    }

    /// Flip a day's visibility.
    pub fn toggle_day_visibility(&mut self, day_id: &DayId) -> bool {
        self.update_day(day_id, |day| {
            day.is_visible = !day.is_visible;
            true
        })
    }

    /// Append a new stop to a day. Returns the generated id.
    pub fn add_stop(&mut self, day_id: &DayId, draft: StopDraft) -> Option<StopId> {
        let id = StopId::generate();
        let stop = draft.into_stop(id.clone());
        self.update_day(day_id, |day| {
            day.stops.push(stop);
            true
        })
        .then_some(id)
    }

    /// Merge `patch` into a stop, keeping its position.
    pub fn update_stop(&mut self, day_id: &DayId, stop_id: &StopId, patch: &StopPatch) -> bool {
        self.update_day(day_id, |day| {
            let Some(stop) = day.stops.iter_mut().find(|s| &s.id == stop_id) else {
                return false;
            };
            patch.apply(stop);
            true
        })
    }

    /// Move a stop to a new location, as when its marker is dragged.
    ///
    /// Locked stops stay where they are.
    pub fn relocate_stop(&mut self, day_id: &DayId, stop_id: &StopId, location: Location) -> bool {
        self.update_day(day_id, |day| {
            match day.stops.iter_mut().find(|s| &s.id == stop_id) {
                Some(stop) if !stop.is_locked => {
                    stop.location = location;
                    true
                }
                _ => false,
            }
        })
    }

    /// Remove a stop from a day.
    pub fn remove_stop(&mut self, day_id: &DayId, stop_id: &StopId) -> bool {
        self.update_day(day_id, |day| {
            let Some(idx) = day.stop_index(stop_id) else {
                return false;
            };
            day.stops.remove(idx);
            true
        })
    }

    /// Swap a stop with its neighbor. No-op at either end of the day.
    pub fn move_stop(&mut self, day_id: &DayId, stop_id: &StopId, direction: Direction) -> bool {
        self.update_day(day_id, |day| {
            let Some(idx) = day.stop_index(stop_id) else {
                return false;
            };
            let target = match direction {
                Direction::Up => idx.checked_sub(1),
                Direction::Down => Some(idx + 1).filter(|&t| t < day.stops.len()),
            };
            match target {
                Some(t) => {
                    day.stops.swap(idx, t);
                    true
                }
                None => false,
            }
        })
    }

    /// Transfer a stop to the end of another day.
    ///
    /// No-op if the days are the same, either day is unknown, or the stop
    /// is not in the source day.
    pub fn move_stop_to_day(&mut self, from: &DayId, to: &DayId, stop_id: &StopId) -> bool {
        if from == to {
            return false;
        }
        self.update(|trip| {
            let (Some(from_idx), Some(to_idx)) = (trip.day_index(from), trip.day_index(to)) else {
                return false;
            };
            let Some(stop_idx) = trip.days[from_idx].stop_index(stop_id) else {
                return false;
            };
            let stop = trip.days[from_idx].stops.remove(stop_idx);
            trip.days[to_idx].stops.push(stop);
            true
        })
    }

    /// Flip a stop's lock.
    pub fn toggle_lock(&mut self, day_id: &DayId, stop_id: &StopId) -> bool {
        self.update_day(day_id, |day| {
            let Some(stop) = day.stops.iter_mut().find(|s| &s.id == stop_id) else {
                return false;
            };
            stop.is_locked = !stop.is_locked;
            true
        })
    }

    /// Replace a day's route segments.
    pub fn update_route_segments(&mut self, day_id: &DayId, segments: Vec<RouteSegment>) -> bool {
        self.update_day(day_id, |day| {
            day.route_segments = segments;
            true
        })
    }

    /// Replace a day's stats.
    pub fn update_day_stats(&mut self, day_id: &DayId, stats: DayStats) -> bool {
        self.update_day(day_id, |day| {
            day.stats = Some(stats);
            true
        })
    }

    /// Replace a day's segments and stats together.
    pub fn commit_route(
        &mut self,
        day_id: &DayId,
        segments: Vec<RouteSegment>,
        stats: DayStats,
    ) -> bool {
        self.update_day(day_id, |day| {
            day.route_segments = segments;
            day.stats = Some(stats);
            true
        })
    }

    /// Drop a day's segments and stats together.
    pub fn clear_route(&mut self, day_id: &DayId) -> bool {
        self.update_day(day_id, |day| {
            if day.route_segments.is_empty() && day.stats.is_none() {
                return false;
            }
            day.route_segments.clear();
            day.stats = None;
            true
        })
    }

    /// Rename the trip.
    pub fn update_trip_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.update(|trip| {
            trip.name = name;
            true
        })
    }

    /// The previous day's final stop, if `day_id` has one to inherit.
    pub fn get_inherited_start(&self, day_id: &DayId) -> Option<InheritedStart> {
        let idx = self.trip.day_index(day_id)?;
        self.trip.inherited_start_at(idx)
    }

    /// Select a day, or clear the selection with `None`. Unknown ids are
    /// ignored.
    pub fn select_day(&mut self, day_id: Option<&DayId>) -> bool {
        match day_id {
            Some(id) if self.trip.day(id).is_none() => false,
            _ => {
                self.selected_day_id = day_id.cloned();
                true
            }
        }
    }

    /// Replace the whole trip, as on import. Colors are re-derived and the
    /// first day is selected.
    pub fn replace_trip(&mut self, mut trip: Trip) {
        trip.recolor_days();
        self.selected_day_id = trip.days.first().map(|d| d.id.clone());
        self.trip = Arc::new(trip);
    }

    /// Totals across days with stats.
    pub fn totals(&self) -> TripTotals {
        self.trip.totals()
    }
}
