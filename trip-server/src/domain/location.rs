//! Geographic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// A WGS84 coordinate pair.
///
/// Values deserialized from snapshots are taken as-is; use [`Location::new`]
/// to validate coordinates coming from user input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Create a validated location.
    ///
    /// Both values must be finite, with `lat` in [-90, 90] and `lng` in
    /// [-180, 180].
    ///
    /// # Examples
    ///
    /// ```
    /// use trip_server::domain::Location;
    ///
    /// assert!(Location::new(48.8566, 2.3522).is_ok());
    /// assert!(Location::new(91.0, 0.0).is_err());
    /// assert!(Location::new(0.0, f64::NAN).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self, DomainError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(DomainError::InvalidLocation {
                lat,
                lng,
                reason: "coordinates must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(DomainError::InvalidLocation {
                lat,
                lng,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(DomainError::InvalidLocation {
                lat,
                lng,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self { lat, lng })
    }

    /// Check the location against the valid coordinate ranges.
    pub fn validate(&self) -> Result<(), DomainError> {
        Self::new(self.lat, self.lng).map(|_| ())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Parse a coordinate pair typed or pasted by a user.
///
/// Accepts `"lat, lng"`, `"lat lng"`, and map URLs containing `@lat,lng`.
/// Returns `None` when the text is not a coordinate pair or the values are
/// out of range.
///
/// # Examples
///
/// ```
/// use trip_server::domain::parse_coordinates;
///
/// let loc = parse_coordinates("48.8566, 2.3522").unwrap();
/// assert_eq!(loc.lat, 48.8566);
///
/// let loc = parse_coordinates("https://maps.example/@47.2184,-1.5536,12z").unwrap();
/// assert_eq!(loc.lng, -1.5536);
///
/// assert!(parse_coordinates("Paris").is_none());
/// ```
pub fn parse_coordinates(input: &str) -> Option<Location> {
    let trimmed = input.trim();
    parse_plain_pair(trimmed).or_else(|| parse_at_pair(trimmed))
}

/// `"lat, lng"` or `"lat lng"` filling the whole input.
fn parse_plain_pair(s: &str) -> Option<Location> {
    let (lat, rest) = take_decimal(s)?;
    let rest_trimmed = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    if rest_trimmed.len() == rest.len() {
        return None;
    }
    let (lng, rest) = take_decimal(rest_trimmed)?;
    if !rest.is_empty() {
        return None;
    }
    Location::new(lat, lng).ok()
}

/// First `@lat,lng` occurrence anywhere in the input.
fn parse_at_pair(s: &str) -> Option<Location> {
    s.match_indices('@').find_map(|(idx, _)| {
        let (lat, rest) = take_decimal(&s[idx + 1..])?;
        let rest = rest.strip_prefix(',')?;
        let (lng, _) = take_decimal(rest)?;
        Location::new(lat, lng).ok()
    })
}

/// Take a leading `-?\d+\.?\d*` number off the front of `s`.
fn take_decimal(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if bytes.first() == Some(&b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == int_start {
        return None;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let value = s[..end].parse::<f64>().ok()?;
    Some((value, &s[end..]))
}
