//! Routing error types.

/// Errors from computing a route.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the routing engine
    #[error("rate limited by routing engine")]
    RateLimited,

    /// Routing engine answered with a non-"Ok" code
    #[error("routing engine error {code}: {message}")]
    Engine { code: String, message: String },

    /// Routing engine returned an unexpected HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Response contained no routes
    #[error("no route found between waypoints")]
    NoRoute,

    /// Number of legs does not match the waypoints sent
    #[error("route has {actual} legs, expected {expected}")]
    LegMismatch { expected: usize, actual: usize },
}

/// Why a queued route job produced no route.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// A newer job for the same key replaced this one before it started
    #[error("superseded by a newer job for the same key")]
    Superseded,

    /// The job was cancelled before it started
    #[error("cancelled before it started")]
    Cancelled,

    /// The job ran and failed
    #[error(transparent)]
    Task(#[from] RoutingError),

    /// The job panicked while running
    #[error("job panicked")]
    Panicked,

    /// The queue went away without answering
    #[error("queue closed")]
    Closed,
}

impl RoutingError {
    /// Whether this failure should push back every later request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RoutingError::RateLimited)
    }
}
