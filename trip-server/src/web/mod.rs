//! Web layer for the trip planner.
//!
//! JSON endpoints over the trip service: one endpoint per store command,
//! plus place search for adding stops.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
