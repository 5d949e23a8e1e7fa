//! Scripted routing engine for tests.

use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::domain::Location;

use super::client::RoutingEngine;
use super::error::RoutingError;
use super::types::EngineRoute;

/// Seconds per leg answered by [`ScriptedEngine`].
pub const LEG_DURATION: f64 = 600.0;

/// Meters per leg answered by [`ScriptedEngine`].
pub const LEG_DISTANCE: f64 = 5000.0;

/// Engine that answers every request with one fixed leg per waypoint pair
/// and records the waypoints it was asked about.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    calls: Mutex<Vec<Vec<Location>>>,
    failing: Mutex<bool>,
}

impl ScriptedEngine {
    /// Make later requests fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Waypoints of every request, in order.
    pub fn calls(&self) -> Vec<Vec<Location>> {
        self.calls.lock().unwrap().clone()
    }
}

impl RoutingEngine for ScriptedEngine {
    fn route<'a>(
        &'a self,
        waypoints: &'a [Location],
    ) -> BoxFuture<'a, Result<EngineRoute, RoutingError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(waypoints.to_vec());
            if *self.failing.lock().unwrap() {
                return Err(RoutingError::Api {
                    status: 503,
                    message: "Service Unavailable".into(),
                });
            }
            Ok(EngineRoute::from_legs(
                (1..waypoints.len()).map(|_| (LEG_DURATION, LEG_DISTANCE)),
            ))
        })
    }
}
