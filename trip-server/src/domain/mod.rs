//! Domain types for the itinerary planner.
//!
//! A `Trip` owns an ordered list of `Day`s, each owning an ordered list of
//! `Stop`s. Route segments and stats on a day are derived data written back
//! by the routing pipeline.

mod day;
mod error;
mod ids;
mod location;
mod stop;
mod trip;

pub use day::{DAY_COLORS, Day, DayStats, INHERITED_START_ID, RouteSegment, day_color};
pub use error::DomainError;
pub use ids::{DayId, StopId};
pub use location::{Location, parse_coordinates};
pub use stop::{DEFAULT_STOP_NAME, PlaceDetails, Stop, StopDraft, StopPatch, StopType};
pub use trip::{DEFAULT_TRIP_NAME, DistanceUnit, InheritedStart, Trip, TripSettings, TripTotals};
