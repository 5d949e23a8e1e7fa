//! Identifier types for days and stops.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a [`Day`](super::Day) within a trip.
///
/// Ids are opaque strings. Freshly created days get a random UUID, but
/// imported snapshots may carry any string (e.g. `"1"`), so no format is
/// enforced.
///
/// # Examples
///
/// ```
/// use trip_server::domain::DayId;
///
/// let id = DayId::from("day-1");
/// assert_eq!(id.as_str(), "day-1");
/// assert_ne!(DayId::generate(), DayId::generate());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayId(String);

impl DayId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        DayId(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DayId {
    fn from(s: &str) -> Self {
        DayId(s.to_string())
    }
}

impl From<String> for DayId {
    fn from(s: String) -> Self {
        DayId(s)
    }
}

impl fmt::Debug for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayId({})", self.0)
    }
}

impl fmt::Display for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a [`Stop`](super::Stop), unique within a trip.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        StopId(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StopId {
    fn from(s: &str) -> Self {
        StopId(s.to_string())
    }
}

impl From<String> for StopId {
    fn from(s: String) -> Self {
        StopId(s)
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..100).map(|_| StopId::generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn display_and_debug() {
        let id = DayId::from("d1");
        assert_eq!(format!("{}", id), "d1");
        assert_eq!(format!("{:?}", id), "DayId(d1)");

        let id = StopId::from("s1-1".to_string());
        assert_eq!(format!("{}", id), "s1-1");
        assert_eq!(format!("{:?}", id), "StopId(s1-1)");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = StopId::from("s2-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s2-3\"");

        let back: DayId = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(back, DayId::from("2"));
    }
}
