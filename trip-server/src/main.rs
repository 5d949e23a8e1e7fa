use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trip_server::config::AppConfig;
use trip_server::geocode::{CachedPlaceSearch, PhotonClient};
use trip_server::routing::OsrmClient;
use trip_server::service::TripService;
use trip_server::store::{SnapshotFile, TripStore};
use trip_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Restore the last trip, or start empty
    let snapshot = SnapshotFile::new(&config.snapshot_path);
    let store = match snapshot.load() {
        Ok(Some(trip)) => {
            info!(trip = %trip.id, days = trip.days.len(), "restored trip");
            TripStore::new(trip)
        }
        Ok(None) => TripStore::default(),
        Err(e) => {
            warn!(path = %config.snapshot_path.display(), error = %e, "ignoring unreadable snapshot");
            TripStore::default()
        }
    };

    let osrm = OsrmClient::new(config.osrm)?;
    let trips = TripService::start(
        store,
        Arc::new(osrm),
        config.queue,
        config.debounce,
        Some(snapshot),
    );

    let photon = PhotonClient::new(config.photon)?;
    let places = CachedPlaceSearch::new(Arc::new(photon), &config.place_cache);

    let state = AppState::new(trips, Arc::new(places));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "trip planner listening");
    axum::serve(listener, app).await?;

    Ok(())
}
