//! Test fixtures for route-engine.
//!
//! Provides realistic test data:
//! - Real Munich locations (from OpenStreetMap)
//! - Order builders and mock driving oracles

pub mod munich_locations;

pub use munich_locations::*;
