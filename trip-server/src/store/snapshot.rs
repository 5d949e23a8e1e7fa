//! Serialized trip snapshots: import validation and the on-disk copy.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::Trip;

use super::error::SnapshotError;

/// Parse and validate an imported snapshot.
///
/// The payload must carry a non-empty `id` and a `days` array; anything else
/// is rejected before deserializing the rest.
pub fn parse_snapshot(json: &str) -> Result<Trip, SnapshotError> {
    let value: Value = serde_json::from_str(json)?;
    validate_snapshot(value)
}

/// Validate an already-parsed snapshot value and convert it to a `Trip`.
pub fn validate_snapshot(value: Value) -> Result<Trip, SnapshotError> {
    let Some(obj) = value.as_object() else {
        return Err(SnapshotError::Invalid("expected a JSON object".to_string()));
    };

    match obj.get("id") {
        Some(Value::String(id)) if !id.is_empty() => {}
        _ => return Err(SnapshotError::Invalid("missing trip id".to_string())),
    }

    if !obj.get("days").is_some_and(Value::is_array) {
        return Err(SnapshotError::Invalid("missing days".to_string()));
    }

    serde_json::from_value(value).map_err(|e| SnapshotError::Invalid(e.to_string()))
}

/// Serialize a trip for export.
pub fn to_snapshot(trip: &Trip) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(trip)?)
}

/// The trip snapshot kept on disk between runs.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// A snapshot file at `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored trip.
    ///
    /// Returns `Ok(None)` if no snapshot has been saved yet.
    pub fn load(&self) -> Result<Option<Trip>, SnapshotError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SnapshotError::Io {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                });
            }
        };
        parse_snapshot(&contents).map(Some)
    }

    /// Save the trip, creating parent directories if needed.
    pub fn save(&self, trip: &Trip) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| SnapshotError::Io {
                message: format!("failed to create snapshot directory: {}", e),
            })?;
        }

        let json = to_snapshot(trip)?;

        std::fs::write(&self.path, json).map_err(|e| SnapshotError::Io {
            message: format!("failed to write snapshot file: {}", e),
        })
    }

    /// Get the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
