//! The running trip: store, routing and persistence wired together.
//!
//! [`TripService`] is the single writer. Every mutation goes through
//! [`TripService::dispatch`], which runs it against the store under one
//! async mutex, hands the resulting trip to the routing orchestrator and
//! saves the snapshot. A background task commits finished routes through
//! the same mutex.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::domain::{DayId, Trip};
use crate::routing::{QueueConfig, RouteOutcome, RoutingEngine, RoutingOrchestrator};
use crate::store::{SnapshotError, SnapshotFile, TripStore, to_snapshot, validate_snapshot};

/// The trip and the current selection, as shown to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub trip: Arc<Trip>,
    pub selected_day_id: Option<DayId>,
}

impl TripView {
    fn of(store: &TripStore) -> Self {
        Self {
            trip: Arc::clone(store.trip()),
            selected_day_id: store.selected_day_id().cloned(),
        }
    }
}

struct Inner {
    store: Mutex<TripStore>,
    orchestrator: RoutingOrchestrator,
    snapshot: Option<SnapshotFile>,
}

impl Inner {
    /// Save the trip if a snapshot file is configured. Failures are logged
    /// and otherwise ignored.
    fn persist(&self, trip: &Trip) {
        let Some(file) = &self.snapshot else {
            return;
        };
        if let Err(e) = file.save(trip) {
            warn!(path = %file.path().display(), error = %e, "failed to save trip snapshot");
        }
    }
}

/// Shared handle to the running trip. Cheap to clone.
#[derive(Clone)]
pub struct TripService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TripService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripService")
            .field("orchestrator", &self.inner.orchestrator)
            .field("snapshot", &self.inner.snapshot)
            .finish_non_exhaustive()
    }
}

impl TripService {
    /// Start the service over `store`.
    ///
    /// Spawns the commit task and schedules routing for the initial trip,
    /// so it must be called from within a tokio runtime.
    pub fn start(
        store: TripStore,
        engine: Arc<dyn RoutingEngine>,
        queue: QueueConfig,
        debounce: Duration,
        snapshot: Option<SnapshotFile>,
    ) -> Self {
        let (orchestrator, outcomes) = RoutingOrchestrator::new(engine, queue, debounce);
        orchestrator.sync(store.trip());

        let inner = Arc::new(Inner {
            store: Mutex::new(store),
            orchestrator,
            snapshot,
        });
        tokio::spawn(commit_routes(Arc::downgrade(&inner), outcomes));

        Self { inner }
    }

    /// Run a command against the store.
    ///
    /// If the trip changed, routing is brought up to date and the snapshot
    /// is saved. Returns the command's result and the resulting view.
    pub async fn dispatch<R>(&self, command: impl FnOnce(&mut TripStore) -> R) -> (R, TripView) {
        let mut store = self.inner.store.lock().await;
        let before = Arc::clone(store.trip());

        let result = command(&mut store);

        let after = store.trip();
        if !Arc::ptr_eq(&before, after) {
            self.inner.orchestrator.sync(after);
            self.inner.persist(after);
        }

        (result, TripView::of(&store))
    }

    /// Run a read-only query against the store.
    pub async fn read<R>(&self, query: impl FnOnce(&TripStore) -> R) -> R {
        let store = self.inner.store.lock().await;
        query(&store)
    }

    /// The current trip and selection.
    pub async fn view(&self) -> TripView {
        self.read(TripView::of).await
    }

    /// Replace the whole trip with an imported snapshot.
    ///
    /// Invalid snapshots are rejected and leave the current trip untouched.
    pub async fn import(&self, value: serde_json::Value) -> Result<TripView, SnapshotError> {
        let trip = validate_snapshot(value)?;
        info!(trip = %trip.id, days = trip.days.len(), "importing trip");
        let ((), view) = self.dispatch(|store| store.replace_trip(trip)).await;
        Ok(view)
    }

    /// Serialize the current trip for export.
    pub async fn export(&self) -> Result<String, SnapshotError> {
        let trip = self.read(|store| Arc::clone(store.trip())).await;
        to_snapshot(&trip)
    }
}

/// Commit finished routes until the service goes away.
async fn commit_routes(inner: Weak<Inner>, mut outcomes: mpsc::UnboundedReceiver<RouteOutcome>) {
    while let Some(outcome) = outcomes.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let mut store = inner.store.lock().await;
        if inner.orchestrator.commit(&mut store, outcome) {
            inner.persist(store.trip());
        }
    }
    debug!("route commit task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, StopDraft, StopId};
    use crate::routing::DEFAULT_DEBOUNCE;
    use crate::routing::mock::{LEG_DISTANCE, LEG_DURATION, ScriptedEngine};
    use crate::store::Direction;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn start(engine: &Arc<ScriptedEngine>, snapshot: Option<SnapshotFile>) -> TripService {
        TripService::start(
            TripStore::default().with_today(today),
            engine.clone(),
            QueueConfig::default(),
            DEFAULT_DEBOUNCE,
            snapshot,
        )
    }

    fn loc(lat: f64) -> Location {
        Location { lat, lng: 2.0 }
    }

    /// Let debounce, queue and commit run to completion.
    async fn settle() {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    async fn day_with_stops(service: &TripService, lats: &[f64]) -> (DayId, Vec<StopId>) {
        let (day, _) = service.dispatch(|s| s.add_day(None)).await;
        let mut stops = Vec::new();
        for &lat in lats {
            let (id, _) = service
                .dispatch(|s| s.add_stop(&day, StopDraft::at(loc(lat))))
                .await;
            stops.push(id.unwrap());
        }
        (day, stops)
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_are_routed_and_committed() {
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, None);

        let (day, _) = day_with_stops(&service, &[48.0, 48.1, 48.2]).await;
        settle().await;

        let view = service.view().await;
        let day = view.trip.day(&day).unwrap();
        assert_eq!(day.route_segments.len(), 2);
        let stats = day.stats.as_ref().unwrap();
        assert_eq!(stats.total_driving_time, 2.0 * LEG_DURATION);
        assert_eq!(stats.total_driving_distance, 2.0 * LEG_DISTANCE);
        assert_eq!(stats.stop_count, 3);
        // The stops were added in quick succession.
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reorder_recomputes_route() {
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, None);

        let (day, stops) = day_with_stops(&service, &[48.0, 48.1]).await;
        settle().await;

        let (moved, _) = service
            .dispatch(|s| s.move_stop(&day, &stops[1], Direction::Up))
            .await;
        assert!(moved);
        settle().await;

        assert_eq!(engine.call_count(), 2);
        assert_eq!(engine.calls()[1], vec![loc(48.1), loc(48.0)]);
        let view = service.view().await;
        let segment = &view.trip.day(&day).unwrap().route_segments[0];
        assert_eq!(segment.from_stop_id, stops[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn noop_commands_do_not_touch_routing() {
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, None);

        let (day, stops) = day_with_stops(&service, &[48.0, 48.1]).await;
        settle().await;

        let (moved, view) = service
            .dispatch(|s| s.move_stop(&day, &stops[0], Direction::Up))
            .await;
        assert!(!moved);
        assert!(view.trip.day(&day).unwrap().has_route());
        settle().await;
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn import_replaces_trip_and_routes_it() {
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, None);

        let snapshot = serde_json::json!({
            "id": "imported",
            "name": "Imported",
            "days": [{
                "id": "d1",
                "date": "2024-06-01",
                "color": "#000000",
                "stops": [
                    {"id": "a", "name": "A", "location": {"lat": 48.0, "lng": 2.0}, "type": "start"},
                    {"id": "b", "name": "B", "location": {"lat": 48.1, "lng": 2.0}, "type": "end"}
                ]
            }]
        });

        let view = service.import(snapshot).await.unwrap();
        assert_eq!(view.trip.name, "Imported");
        assert_eq!(view.trip.days[0].color, "#3B82F6");
        assert_eq!(view.selected_day_id, Some(DayId::from("d1")));

        settle().await;
        let view = service.view().await;
        assert!(view.trip.days[0].has_route());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_import_keeps_current_trip() {
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, None);
        service.dispatch(|s| s.update_trip_name("Keep me")).await;

        let err = service
            .import(serde_json::json!({"name": "No id", "days": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Invalid(_)));
        assert_eq!(service.view().await.trip.name, "Keep me");
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_and_routes_are_saved() {
        let dir = tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("trip.json"));
        let engine = Arc::new(ScriptedEngine::default());
        let service = start(&engine, Some(file.clone()));

        let (day, _) = day_with_stops(&service, &[48.0, 48.1]).await;
        settle().await;

        let saved = file.load().unwrap().unwrap();
        assert!(saved.day(&day).unwrap().has_route());

        let exported = service.export().await.unwrap();
        assert_eq!(crate::store::parse_snapshot(&exported).unwrap(), saved);
    }

    #[tokio::test(start_paused = true)]
    async fn routing_failure_is_not_fatal() {
        let engine = Arc::new(ScriptedEngine::default());
        engine.set_failing(true);
        let service = start(&engine, None);

        let (day, _) = day_with_stops(&service, &[48.0, 48.1]).await;
        settle().await;

        let view = service.view().await;
        assert!(!view.trip.day(&day).unwrap().has_route());

        engine.set_failing(false);
        service
            .dispatch(|s| s.add_stop(&day, StopDraft::at(loc(48.2))))
            .await;
        settle().await;
        assert!(service.view().await.trip.day(&day).unwrap().has_route());
    }
}
