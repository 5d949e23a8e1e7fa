//! Turning an engine route into per-leg segments and day stats.

use crate::domain::{DayStats, INHERITED_START_ID, Location, RouteSegment, StopId, Trip};

use super::error::RoutingError;
use super::types::EngineRoute;

/// The parts of a stop that affect its day's route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub id: StopId,
    pub location: Location,
    /// Minutes.
    pub duration: Option<u32>,
}

/// Everything a day's route is computed from.
///
/// Two equal inputs produce the same route, so the orchestrator compares
/// these to decide whether a day needs routing again.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInput {
    /// Location of the previous day's final stop.
    pub inherited_start: Option<Location>,
    pub stops: Vec<RouteStop>,
}

impl RouteInput {
    /// Route input of the day at `index`. `None` if there is no such day.
    pub fn for_day(trip: &Trip, index: usize) -> Option<Self> {
        let day = trip.days.get(index)?;
        Some(Self {
            inherited_start: trip.inherited_start_at(index).map(|s| s.stop.location),
            stops: day
                .stops
                .iter()
                .map(|s| RouteStop {
                    id: s.id.clone(),
                    location: s.location,
                    duration: s.duration,
                })
                .collect(),
        })
    }

    /// Effective waypoints in visiting order, inherited start first.
    pub fn waypoints(&self) -> Vec<Location> {
        self.inherited_start
            .into_iter()
            .chain(self.stops.iter().map(|s| s.location))
            .collect()
    }

    /// Whether there are enough waypoints for a route.
    pub fn is_routable(&self) -> bool {
        self.stops.len() + usize::from(self.inherited_start.is_some()) >= 2
    }
}

/// Segments and stats computed from one engine response.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRoute {
    pub segments: Vec<RouteSegment>,
    pub stats: DayStats,
}

/// Build a day's segments and stats from an engine route.
///
/// Returns `Ok(None)` when the input has fewer than two waypoints. A route
/// whose leg count does not match the waypoints is rejected.
pub fn build_day_route(
    input: &RouteInput,
    route: &EngineRoute,
) -> Result<Option<DayRoute>, RoutingError> {
    if !input.is_routable() {
        return Ok(None);
    }

    let ids: Vec<StopId> = input
        .inherited_start
        .map(|_| StopId::from(INHERITED_START_ID))
        .into_iter()
        .chain(input.stops.iter().map(|s| s.id.clone()))
        .collect();

    let expected = ids.len() - 1;
    if route.legs.len() != expected {
        return Err(RoutingError::LegMismatch {
            expected,
            actual: route.legs.len(),
        });
    }

    let segments: Vec<RouteSegment> = ids
        .windows(2)
        .zip(&route.legs)
        .map(|(pair, leg)| RouteSegment {
            from_stop_id: pair[0].clone(),
            to_stop_id: pair[1].clone(),
            distance: leg.distance,
            duration: leg.duration,
        })
        .collect();

    let stats = DayStats {
        total_driving_time: route.legs.iter().map(|l| l.duration).sum(),
        total_driving_distance: route.legs.iter().map(|l| l.distance).sum(),
        total_activity_time: input
            .stops
            .iter()
            .filter_map(|s| s.duration)
            .map(u64::from)
            .sum(),
        stop_count: input.stops.len(),
    };

    Ok(Some(DayRoute { segments, stats }))
}
