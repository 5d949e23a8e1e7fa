//! Trip state: the store and its serialized snapshots.

mod error;
mod snapshot;
mod trip_store;

pub use error::SnapshotError;
pub use snapshot::{SnapshotFile, parse_snapshot, to_snapshot, validate_snapshot};
pub use trip_store::{Direction, TripStore};
