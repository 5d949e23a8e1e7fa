//! Snapshot error types.

/// Errors from importing, loading or saving a trip snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The payload is not a usable trip
    #[error("invalid trip snapshot: {0}")]
    Invalid(String),

    /// Failed to parse or produce JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write the snapshot file
    #[error("snapshot file error: {message}")]
    Io { message: String },
}
