//! Road trip planner server.
//!
//! Keeps a multi-day driving itinerary, routes each day through OSRM as its
//! stops change, and finds places to add through Photon.

pub mod config;
pub mod domain;
pub mod geocode;
pub mod routing;
pub mod service;
pub mod store;
pub mod web;
