//! Keeps each day's route in step with its stops.
//!
//! [`RoutingOrchestrator::sync`] is called with every new trip snapshot. It
//! compares each visible day's [`RouteInput`] with the last one it saw and,
//! for days that changed, restarts a debounce timer that eventually submits
//! the day to the [`RouteQueue`]. Finished routes come back as
//! [`RouteOutcome`]s on a channel, and [`RoutingOrchestrator::commit`] writes
//! the ones that are still current into the store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::{DayId, Trip};
use crate::store::TripStore;

use super::client::RoutingEngine;
use super::error::{QueueError, RoutingError};
use super::queue::{QueueConfig, RouteQueue};
use super::segments::{DayRoute, RouteInput, build_day_route};

/// Default quiet period before a changed day is routed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Result of routing one day.
#[derive(Debug)]
pub struct RouteOutcome {
    pub day_id: DayId,
    /// Generation of the day's input this result was computed from.
    pub generation: u64,
    /// `Ok(None)` means the day has too few waypoints and its route should
    /// be cleared.
    pub result: Result<Option<DayRoute>, RoutingError>,
}

#[derive(Debug, Default)]
struct DayTracker {
    input: Option<RouteInput>,
    generation: u64,
    debounce: Option<JoinHandle<()>>,
}

impl DayTracker {
    fn abort_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

/// What a debounce task needs to route one day and report back.
#[derive(Clone)]
struct Submitter {
    engine: Arc<dyn RoutingEngine>,
    queue: RouteQueue<DayId, Option<DayRoute>>,
    outcomes: mpsc::UnboundedSender<RouteOutcome>,
    debounce: Duration,
}

impl Submitter {
    /// Wait out the debounce, route `input` through the queue and send the
    /// outcome. Sends nothing if a newer generation took the day over.
    async fn submit(self, day_id: DayId, generation: u64, input: RouteInput) {
        let Submitter {
            engine,
            queue,
            outcomes,
            debounce,
        } = self;

        tokio::time::sleep(debounce).await;

        let result = if input.is_routable() {
            let handle = queue.enqueue(day_id.clone(), move || async move {
                let waypoints = input.waypoints();
                let route = engine.route(&waypoints).await?;
                build_day_route(&input, &route)
            });
            match handle.wait().await {
                Ok(route) => Ok(route),
                Err(QueueError::Task(e)) => Err(e),
                Err(QueueError::Superseded | QueueError::Cancelled) => return,
                Err(e) => {
                    warn!(day = %day_id, error = %e, "route job lost");
                    return;
                }
            }
        } else {
            Ok(None)
        };

        // The receiver only goes away on shutdown.
        let _ = outcomes.send(RouteOutcome {
            day_id,
            generation,
            result,
        });
    }
}

/// Debounces route requests per day and feeds them through the queue.
pub struct RoutingOrchestrator {
    submitter: Submitter,
    days: Mutex<HashMap<DayId, DayTracker>>,
}

impl std::fmt::Debug for RoutingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingOrchestrator")
            .field("queue", &self.submitter.queue)
            .field("debounce", &self.submitter.debounce)
            .finish_non_exhaustive()
    }
}

impl RoutingOrchestrator {
    /// Create an orchestrator and the receiving end of its outcome channel.
    pub fn new(
        engine: Arc<dyn RoutingEngine>,
        queue_config: QueueConfig,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<RouteOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            submitter: Submitter {
                engine,
                queue: RouteQueue::new(queue_config),
                outcomes,
                debounce,
            },
            days: Mutex::new(HashMap::new()),
        };
        (orchestrator, rx)
    }

    fn lock_days(&self) -> MutexGuard<'_, HashMap<DayId, DayTracker>> {
        self.days.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule routing for every visible day whose route input changed
    /// since the last call, and forget days that no longer exist.
    ///
    /// Must be called from within a tokio runtime.
    pub fn sync(&self, trip: &Trip) {
        let queue = &self.submitter.queue;
        let mut days = self.lock_days();
        let mut present = HashSet::with_capacity(trip.days.len());

        for (index, day) in trip.days.iter().enumerate() {
            present.insert(&day.id);
            if !day.is_visible {
                continue;
            }
            let Some(input) = RouteInput::for_day(trip, index) else {
                continue;
            };

            let tracker = days.entry(day.id.clone()).or_default();
            if tracker.input.as_ref() == Some(&input) {
                continue;
            }

            tracker.generation += 1;
            tracker.input = Some(input.clone());
            tracker.abort_debounce();
            queue.cancel(&day.id);

            trace!(day = %day.id, generation = tracker.generation, "route input changed");
            let submission = self
                .submitter
                .clone()
                .submit(day.id.clone(), tracker.generation, input);
            tracker.debounce = Some(tokio::spawn(submission));
        }

        days.retain(|day_id, tracker| {
            if present.contains(day_id) {
                return true;
            }
            debug!(day = %day_id, "day removed, dropping pending route");
            tracker.abort_debounce();
            queue.cancel(day_id);
            false
        });
    }

    /// Whether `generation` is the latest input seen for `day_id`.
    pub fn is_current(&self, day_id: &DayId, generation: u64) -> bool {
        self.lock_days()
            .get(day_id)
            .is_some_and(|t| t.generation == generation)
    }

    /// Write an outcome into the store if it is still current.
    ///
    /// Segments and stats are replaced together on success and cleared
    /// together when the day is no longer routable. Failures leave the
    /// previous route in place. Returns whether the trip changed.
    pub fn commit(&self, store: &mut TripStore, outcome: RouteOutcome) -> bool {
        let RouteOutcome {
            day_id,
            generation,
            result,
        } = outcome;

        if !self.is_current(&day_id, generation) {
            debug!(day = %day_id, generation, "dropping stale route");
            return false;
        }

        match result {
            Ok(Some(route)) => {
                debug!(
                    day = %day_id,
                    segments = route.segments.len(),
                    driving_secs = route.stats.total_driving_time,
                    "committing route"
                );
                store.commit_route(&day_id, route.segments, route.stats)
            }
            Ok(None) => store.clear_route(&day_id),
            Err(e) => {
                warn!(day = %day_id, error = %e, "route computation failed");
                false
            }
        }
    }
}

impl Drop for RoutingOrchestrator {
    fn drop(&mut self) {
        for tracker in self.lock_days().values_mut() {
            tracker.abort_debounce();
        }
    }
}
