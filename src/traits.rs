//! Seams between the engine and its external routing collaborators.

use crate::error::OracleError;
use crate::order::Coordinate;
use crate::polyline::Polyline;

/// Distance, duration and geometry of a driven route.
#[derive(Debug, Clone, PartialEq)]
pub struct DrivingSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Polyline,
}

impl DrivingSummary {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn duration_secs(&self) -> i32 {
        self.duration_s.round() as i32
    }
}

/// A driving-direction service.
///
/// Calls block and may fail. Implementations must report failures as errors
/// and never substitute a straight-line estimate; falling back is the
/// caller's decision.
pub trait DrivingOracle: Send + Sync {
    /// Service name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Drive along `waypoints` in order. Requires at least two waypoints.
    fn fetch_driving_route(&self, waypoints: &[Coordinate]) -> Result<DrivingSummary, OracleError>;

    /// Drive a single origin to destination leg.
    fn fetch_driving_leg(&self, from: Coordinate, to: Coordinate) -> Result<DrivingSummary, OracleError> {
        self.fetch_driving_route(&[from, to])
    }
}

pub(crate) fn ensure_waypoints(waypoints: &[Coordinate]) -> Result<(), OracleError> {
    if waypoints.len() < 2 {
        return Err(OracleError::TooFewWaypoints {
            count: waypoints.len(),
        });
    }
    Ok(())
}
