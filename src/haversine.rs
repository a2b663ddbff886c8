//! Straight-line distance estimates (fallback when no driving service answers).
//!
//! Uses great-circle distance. Less accurate than a road network but always
//! available and synchronous.

use crate::order::Coordinate;

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Empirical ratio between road distance and straight-line distance.
pub const DEFAULT_ROAD_COEFFICIENT: f64 = 1.3;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers.
///
/// Raw distance, without any road adjustment. Route ordering compares these
/// values directly.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Turns straight-line distance into road-adjusted distance and drive time.
#[derive(Debug, Clone)]
pub struct StraightLineEstimator {
    /// Multiplier applied to great-circle distance.
    pub road_coefficient: f64,
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for StraightLineEstimator {
    fn default() -> Self {
        Self {
            road_coefficient: DEFAULT_ROAD_COEFFICIENT,
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl StraightLineEstimator {
    pub fn new(road_coefficient: f64, speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            speed_kmh,
        }
    }

    /// Estimated road distance between two points in kilometers.
    pub fn road_km(&self, from: Coordinate, to: Coordinate) -> f64 {
        haversine_km(from, to) * self.road_coefficient
    }

    /// Convert road distance in km to travel time in seconds.
    pub fn km_to_seconds(&self, km: f64) -> i32 {
        if self.speed_kmh <= 0.0 {
            return 0;
        }
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let p = Coordinate::new(48.1351, 11.5820);
        assert!(haversine_km(p, p) < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Munich to Berlin, roughly 504 km as the crow flies
        let munich = Coordinate::new(48.1351, 11.5820);
        let berlin = Coordinate::new(52.5200, 13.4050);
        let dist = haversine_km(munich, berlin);
        assert!(dist > 490.0 && dist < 520.0, "Munich to Berlin should be ~504km, got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Coordinate::new(48.1402, 11.5586);
        let b = Coordinate::new(48.1325, 11.5674);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_road_km_applies_coefficient() {
        let estimator = StraightLineEstimator::default();
        let a = Coordinate::new(48.1351, 11.5820);
        let b = Coordinate::new(48.1402, 11.5586);
        let raw = haversine_km(a, b);
        assert!((estimator.road_km(a, b) - raw * 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let estimator = StraightLineEstimator::new(1.3, 40.0);
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert_eq!(estimator.km_to_seconds(10.0), 900);
    }

    #[test]
    fn test_zero_speed_gives_zero_time() {
        let estimator = StraightLineEstimator::new(1.3, 0.0);
        assert_eq!(estimator.km_to_seconds(10.0), 0);
    }
}
