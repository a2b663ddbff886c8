//! Error types raised by the routing engine and its oracles.

use thiserror::Error;

use crate::order::OrderId;
use crate::strategy::RouteStrategy;

/// A driving-direction service could not answer.
///
/// The engine treats every variant as "oracle unavailable": the straight-line
/// estimate stays in place and the caller receives an advisory.
#[derive(Debug, Error)]
pub enum OracleError {
    /// A driving route needs an origin and a destination.
    #[error("driving route needs at least two waypoints, got {count}")]
    TooFewWaypoints { count: usize },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    /// The request never produced a response.
    #[error("request to {service} failed")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("{service} answered with HTTP {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },
    /// The response body could not be understood.
    #[error("{service} returned a malformed response: {reason}")]
    Malformed { service: &'static str, reason: String },
    /// The service answered but found no route between the waypoints.
    #[error("{service} found no route: {reason}")]
    NoRoute { service: &'static str, reason: String },
    /// The oracle panicked while answering.
    #[error("{service} panicked while answering")]
    Panicked { service: &'static str },
}

impl OracleError {
    pub(crate) fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            OracleError::Status { service, status }
        } else if err.is_decode() {
            OracleError::Malformed {
                service,
                reason: err.to_string(),
            }
        } else {
            OracleError::Transport {
                service,
                source: err,
            }
        }
    }
}

/// A caller-facing engine operation was rejected. No state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Manual reordering was requested outside the manual strategy.
    #[error("manual reordering requires the manual strategy, current strategy is {strategy:?}")]
    InvalidStrategyOperation { strategy: RouteStrategy },
    /// The order is not part of the current working set.
    #[error("order {0} is not in the current working set")]
    UnknownOrderId(OrderId),
}

/// Configuration could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("unknown routing oracle {0:?}, expected none, osrm or openroute")]
    UnknownOracle(String),
    #[error("{0} must be set")]
    MissingVar(&'static str),
}

/// An encoded polyline could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("polyline ends inside a value at byte {position}")]
    Truncated { position: usize },
    #[error("invalid polyline character at byte {position}")]
    InvalidCharacter { position: usize },
    #[error("polyline value overflows at byte {position}")]
    Overflow { position: usize },
}
