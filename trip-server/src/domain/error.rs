//! Domain error types.
//!
//! These errors represent validation failures on user-supplied values.
//! Stale or unknown ids are not errors: store operations absorb them as
//! no-ops.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Coordinates outside the WGS84 ranges, or not finite
    #[error("invalid location ({lat}, {lng}): {reason}")]
    InvalidLocation {
        lat: f64,
        lng: f64,
        reason: &'static str,
    },
}
