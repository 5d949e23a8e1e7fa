//! Driving routes for each day.
//!
//! The pipeline: [`RoutingOrchestrator`] notices a day's stops changed,
//! debounces, and submits the day to the [`RouteQueue`], which paces calls
//! to the [`RoutingEngine`] (OSRM in production). The engine's legs are
//! turned into segments and stats by [`build_day_route`].

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;
mod orchestrator;
mod queue;
mod segments;
mod types;

pub use client::{OsrmClient, OsrmConfig, RoutingEngine};
pub use error::{QueueError, RoutingError};
pub use orchestrator::{DEFAULT_DEBOUNCE, RouteOutcome, RoutingOrchestrator};
pub use queue::{
    DEFAULT_MIN_DELAY, DEFAULT_RATE_LIMIT_BACKOFF, JobHandle, QueueConfig, RouteQueue,
};
pub use segments::{DayRoute, RouteInput, RouteStop, build_day_route};
pub use types::{EngineRoute, OsrmRouteResponse, RouteLeg};
