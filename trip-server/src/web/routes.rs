//! HTTP route handlers.
//!
//! Mutations reply with the resulting trip. Ids that name no day or stop
//! leave the trip unchanged and still succeed, since clients act on
//! snapshots that may be out of date.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use tracing::{error, warn};

use crate::domain::{
    DayId, DomainError, Location, PlaceDetails, StopDraft, StopId, StopPatch, TripTotals,
    parse_coordinates,
};
use crate::geocode::{GeocodeError, SearchResult};
use crate::service::TripView;
use crate::store::SnapshotError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/trip", get(get_trip).put(import_trip))
        .route("/api/trip/export", get(export_trip))
        .route("/api/trip/name", put(rename_trip))
        .route("/api/trip/totals", get(trip_totals))
        .route("/api/days", post(add_day))
        .route("/api/days/:day", delete(remove_day))
        .route("/api/days/:day/visibility", post(toggle_day_visibility))
        .route("/api/days/:day/select", post(select_day))
        .route("/api/days/:day/inherited-start", get(inherited_start))
        .route("/api/days/:day/stops", post(add_stop))
        .route(
            "/api/days/:day/stops/:stop",
            patch(update_stop).delete(remove_stop),
        )
        .route("/api/days/:day/stops/:stop/move", post(move_stop))
        .route("/api/days/:day/stops/:stop/transfer", post(transfer_stop))
        .route("/api/days/:day/stops/:stop/lock", post(toggle_lock))
        .route("/api/days/:day/stops/:stop/relocate", post(relocate_stop))
        .route("/api/places/search", get(search_places))
        .route("/api/places/reverse", get(reverse_geocode))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn get_trip(State(state): State<AppState>) -> Json<TripView> {
    Json(state.trips.view().await)
}

/// Replace the trip with an uploaded snapshot.
async fn import_trip(
    State(state): State<AppState>,
    Json(snapshot): Json<serde_json::Value>,
) -> Result<Json<TripView>, AppError> {
    Ok(Json(state.trips.import(snapshot).await?))
}

/// Download the trip as a snapshot file.
async fn export_trip(State(state): State<AppState>) -> Result<Response, AppError> {
    let json = state.trips.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"trip.json\""),
        ],
        json,
    )
        .into_response())
}

async fn rename_trip(
    State(state): State<AppState>,
    Json(req): Json<RenameTripRequest>,
) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.update_trip_name(req.name)).await;
    Json(view)
}

async fn trip_totals(State(state): State<AppState>) -> Json<TripTotals> {
    Json(state.trips.read(|s| s.totals()).await)
}

/// Add a day. The body is optional.
async fn add_day(
    State(state): State<AppState>,
    req: Option<Json<AddDayRequest>>,
) -> Json<AddDayResponse> {
    let after = req.and_then(|Json(r)| r.after_day_id);
    let (day_id, view) = state.trips.dispatch(|s| s.add_day(after.as_ref())).await;
    Json(AddDayResponse { day_id, view })
}

async fn remove_day(State(state): State<AppState>, Path(day): Path<DayId>) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.remove_day(&day)).await;
    Json(view)
}

async fn toggle_day_visibility(
    State(state): State<AppState>,
    Path(day): Path<DayId>,
) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.toggle_day_visibility(&day)).await;
    Json(view)
}

async fn select_day(State(state): State<AppState>, Path(day): Path<DayId>) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.select_day(Some(&day))).await;
    Json(view)
}

/// The previous day's last stop, or `null` if the day has none to inherit.
async fn inherited_start(
    State(state): State<AppState>,
    Path(day): Path<DayId>,
) -> Result<Json<Option<InheritedStartResponse>>, AppError> {
    let start = state
        .trips
        .read(|s| {
            s.trip()
                .day(&day)
                .map(|_| s.get_inherited_start(&day).map(InheritedStartResponse::from))
        })
        .await;

    start.map(Json).ok_or_else(|| AppError::NotFound {
        message: format!("Day not found: {day}"),
    })
}

async fn add_stop(
    State(state): State<AppState>,
    Path(day): Path<DayId>,
    Json(draft): Json<StopDraft>,
) -> Result<Json<AddStopResponse>, AppError> {
    draft.location.as_ref().map(Location::validate).transpose()?;

    let (stop_id, view) = state.trips.dispatch(|s| s.add_stop(&day, draft)).await;
    Ok(Json(AddStopResponse { stop_id, view }))
}

async fn update_stop(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
    Json(patch): Json<StopPatch>,
) -> Result<Json<TripView>, AppError> {
    patch.location.as_ref().map(Location::validate).transpose()?;

    let (_, view) = state
        .trips
        .dispatch(|s| s.update_stop(&day, &stop, &patch))
        .await;
    Ok(Json(view))
}

async fn remove_stop(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.remove_stop(&day, &stop)).await;
    Json(view)
}

async fn move_stop(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
    Json(req): Json<MoveStopRequest>,
) -> Json<TripView> {
    let (_, view) = state
        .trips
        .dispatch(|s| s.move_stop(&day, &stop, req.direction))
        .await;
    Json(view)
}

async fn transfer_stop(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
    Json(req): Json<TransferStopRequest>,
) -> Json<TripView> {
    let (_, view) = state
        .trips
        .dispatch(|s| s.move_stop_to_day(&day, &req.to_day_id, &stop))
        .await;
    Json(view)
}

async fn toggle_lock(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
) -> Json<TripView> {
    let (_, view) = state.trips.dispatch(|s| s.toggle_lock(&day, &stop)).await;
    Json(view)
}

/// Move a stop's marker. Locked stops stay put.
async fn relocate_stop(
    State(state): State<AppState>,
    Path((day, stop)): Path<(DayId, StopId)>,
    Json(req): Json<RelocateStopRequest>,
) -> Result<Json<TripView>, AppError> {
    req.location.validate()?;

    let (_, view) = state
        .trips
        .dispatch(|s| s.relocate_stop(&day, &stop, req.location))
        .await;
    Ok(Json(view))
}

/// Search places by name. Coordinates typed into the box are answered
/// directly.
async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PlaceSearchQuery>,
) -> Result<Json<PlaceSearchResponse>, AppError> {
    if query.q.trim().is_empty() {
        return Ok(Json(PlaceSearchResponse {
            results: Vec::new(),
        }));
    }

    if let Some(location) = parse_coordinates(&query.q) {
        return Ok(Json(PlaceSearchResponse {
            results: vec![SearchResult::from_coordinates(location)],
        }));
    }

    let near = query.near().filter(|l| l.validate().is_ok());
    let results = state.places.search(&query.q, near).await?;
    Ok(Json(PlaceSearchResponse { results }))
}

/// Describe the place at a coordinate, or `null` if nothing is known.
async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<Option<PlaceDetails>>, AppError> {
    let location = Location::new(query.lat, query.lng)?;
    Ok(Json(state.places.reverse(location).await?))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unavailable { message: String },
    Internal { message: String },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<SnapshotError> for AppError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Invalid(_) | SnapshotError::Json(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            SnapshotError::Io { .. } => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::RateLimited => AppError::Unavailable {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use futures::future::BoxFuture;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::geocode::PlaceSearch;
    use crate::routing::mock::ScriptedEngine;
    use crate::routing::{DEFAULT_DEBOUNCE, QueueConfig};
    use crate::service::TripService;
    use crate::store::TripStore;

    /// Place search that answers from a fixed list and counts calls.
    #[derive(Default)]
    struct StubPlaces {
        searches: Mutex<Vec<String>>,
    }

    impl PlaceSearch for StubPlaces {
        fn search<'a>(
            &'a self,
            query: &'a str,
            near: Option<Location>,
        ) -> BoxFuture<'a, Result<Vec<SearchResult>, GeocodeError>> {
            Box::pin(async move {
                self.searches.lock().unwrap().push(query.to_string());
                if query == "busy" {
                    return Err(GeocodeError::RateLimited);
                }
                Ok(vec![SearchResult {
                    id: "N-1".into(),
                    name: query.to_string(),
                    display_address: "Paris, France".into(),
                    location: near.unwrap_or(Location {
                        lat: 48.8566,
                        lng: 2.3522,
                    }),
                    place_details: PlaceDetails {
                        display_name: query.to_string(),
                        ..Default::default()
                    },
                }])
            })
        }

        fn reverse(
            &self,
            _location: Location,
        ) -> BoxFuture<'_, Result<Option<PlaceDetails>, GeocodeError>> {
            Box::pin(async {
                Ok(Some(PlaceDetails {
                    display_name: "Louvre".into(),
                    city: Some("Paris".into()),
                    ..Default::default()
                }))
            })
        }
    }

    struct TestApp {
        state: AppState,
        places: Arc<StubPlaces>,
    }

    impl TestApp {
        fn new() -> Self {
            let places = Arc::new(StubPlaces::default());
            let trips = TripService::start(
                TripStore::default(),
                Arc::new(ScriptedEngine::default()),
                QueueConfig::default(),
                DEFAULT_DEBOUNCE,
                None,
            );
            Self {
                state: AppState::new(trips, places.clone()),
                places,
            }
        }

        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(json) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };

            let resp = create_router(self.state.clone())
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = resp.status();
            let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
            };
            (status, value)
        }

        async fn add_day(&self) -> String {
            let (status, body) = self.send("POST", "/api/days", None).await;
            assert_eq!(status, StatusCode::OK);
            body["dayId"].as_str().unwrap().to_string()
        }

        async fn add_stop(&self, day: &str, name: &str, lat: f64) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    &format!("/api/days/{day}/stops"),
                    Some(json!({"name": name, "location": {"lat": lat, "lng": 2.0}})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["stopId"].as_str().unwrap().to_string()
        }
    }

    fn stop_names(trip: &Value, day_index: usize) -> Vec<String> {
        trip["days"][day_index]["stops"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn health_check() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn build_a_day() {
        let app = TestApp::new();
        let day = app.add_day().await;
        app.add_stop(&day, "Paris", 48.8566).await;
        let versailles = app.add_stop(&day, "Versailles", 48.8049).await;

        let (status, body) = app.send("GET", "/api/trip", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selectedDayId"], day);
        assert_eq!(body["trip"]["days"][0]["color"], "#3B82F6");
        assert_eq!(stop_names(&body["trip"], 0), vec!["Paris", "Versailles"]);

        let (_, body) = app
            .send(
                "POST",
                &format!("/api/days/{day}/stops/{versailles}/move"),
                Some(json!({"direction": "up"})),
            )
            .await;
        assert_eq!(stop_names(&body["trip"], 0), vec!["Versailles", "Paris"]);

        let (_, body) = app
            .send(
                "PATCH",
                &format!("/api/days/{day}/stops/{versailles}"),
                Some(json!({"duration": 180, "type": "activity"})),
            )
            .await;
        let stop = &body["trip"]["days"][0]["stops"][0];
        assert_eq!(stop["duration"], 180);
        assert_eq!(stop["type"], "activity");
    }

    #[tokio::test]
    async fn invalid_coordinates_are_rejected() {
        let app = TestApp::new();
        let day = app.add_day().await;

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/days/{day}/stops"),
                Some(json!({"location": {"lat": 91.0, "lng": 0.0}})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid location"));

        let (_, body) = app.send("GET", "/api/trip", None).await;
        assert!(stop_names(&body["trip"], 0).is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_leave_trip_unchanged() {
        let app = TestApp::new();
        let day = app.add_day().await;
        let (_, before) = app.send("GET", "/api/trip", None).await;

        let (status, body) = app.send("DELETE", "/api/days/missing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trip"], before["trip"]);

        let (status, body) = app
            .send("POST", &format!("/api/days/{day}/stops/missing/lock"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trip"], before["trip"]);

        let (status, body) = app
            .send("POST", "/api/days/missing/stops", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stopId"], Value::Null);
    }

    #[tokio::test]
    async fn transfer_between_days() {
        let app = TestApp::new();
        let first = app.add_day().await;
        let second = app.add_day().await;
        let stop = app.add_stop(&first, "Lyon", 45.76).await;

        let (_, body) = app
            .send(
                "POST",
                &format!("/api/days/{first}/stops/{stop}/transfer"),
                Some(json!({"toDayId": second})),
            )
            .await;
        assert!(stop_names(&body["trip"], 0).is_empty());
        assert_eq!(stop_names(&body["trip"], 1), vec!["Lyon"]);
    }

    #[tokio::test]
    async fn inherited_start_lookup() {
        let app = TestApp::new();
        let first = app.add_day().await;
        let second = app.add_day().await;

        let (status, body) = app
            .send("GET", &format!("/api/days/{second}/inherited-start"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        app.add_stop(&first, "Hotel", 48.0).await;
        let (_, body) = app
            .send("GET", &format!("/api/days/{second}/inherited-start"), None)
            .await;
        assert_eq!(body["stop"]["name"], "Hotel");
        assert_eq!(body["fromDayIndex"], 0);

        let (status, _) = app
            .send("GET", "/api/days/missing/inherited-start", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn locked_stop_is_not_relocated() {
        let app = TestApp::new();
        let day = app.add_day().await;
        let stop = app.add_stop(&day, "Fixed", 48.0).await;
        app.send("POST", &format!("/api/days/{day}/stops/{stop}/lock"), None)
            .await;

        let (_, body) = app
            .send(
                "POST",
                &format!("/api/days/{day}/stops/{stop}/relocate"),
                Some(json!({"location": {"lat": 10.0, "lng": 10.0}})),
            )
            .await;
        let stop = &body["trip"]["days"][0]["stops"][0];
        assert_eq!(stop["isLocked"], true);
        assert_eq!(stop["location"]["lat"], 48.0);
    }

    #[tokio::test]
    async fn import_and_export() {
        let app = TestApp::new();

        let (status, body) = app
            .send("PUT", "/api/trip", Some(json!({"name": "no id", "days": []})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("missing trip id"));

        let (status, body) = app
            .send(
                "PUT",
                "/api/trip",
                Some(json!({"id": "t1", "name": "Alps", "days": []})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trip"]["name"], "Alps");

        let (status, body) = app.send("GET", "/api/trip/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "t1");
        assert_eq!(body["settings"]["distanceUnit"], "km");
    }

    #[tokio::test]
    async fn rename_and_totals() {
        let app = TestApp::new();
        let (_, body) = app
            .send("PUT", "/api/trip/name", Some(json!({"name": "Coast"})))
            .await;
        assert_eq!(body["trip"]["name"], "Coast");

        let (status, body) = app.send("GET", "/api/trip/totals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stops"], 0);
        assert_eq!(body["drivingDistance"], 0.0);
    }

    #[tokio::test]
    async fn coordinate_queries_skip_search() {
        let app = TestApp::new();
        let (status, body) = app
            .send("GET", "/api/places/search?q=48.8566,%202.3522", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "coords");
        assert_eq!(body["results"][0]["displayAddress"], "Custom coordinates");
        assert!(app.places.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn text_queries_use_search() {
        let app = TestApp::new();
        let (status, body) = app
            .send("GET", "/api/places/search?q=Louvre&lat=48.86&lng=2.33", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["name"], "Louvre");
        assert_eq!(body["results"][0]["location"]["lat"], 48.86);

        let (status, _) = app.send("GET", "/api/places/search?q=busy", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (_, body) = app.send("GET", "/api/places/search?q=%20", None).await;
        assert_eq!(body["results"], json!([]));
        assert_eq!(app.places.searches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reverse_lookup() {
        let app = TestApp::new();
        let (status, body) = app
            .send("GET", "/api/places/reverse?lat=48.86&lng=2.33", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["displayName"], "Louvre");

        let (status, _) = app
            .send("GET", "/api/places/reverse?lat=100&lng=2.33", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
