//! route-engine core
//!
//! Orders a technician's open jobs into a route and estimates distance and
//! drive time, refining straight-line figures from a driving service when one
//! is available.

pub mod config;
pub mod engine;
pub mod error;
pub mod haversine;
pub mod openroute;
pub mod order;
pub mod osrm;
pub mod polyline;
pub mod route;
pub mod stats;
pub mod strategy;
pub mod traits;

pub use config::{EngineConfig, OracleConfig};
pub use engine::{EngineEvent, RefinementOutcome, RouteEngine, RoutePlan, RouteSignature};
pub use error::{ConfigError, EngineError, OracleError};
pub use order::{Coordinate, Order, OrderId, OrderStatus, Priority};
pub use stats::RouteStats;
pub use strategy::RouteStrategy;
