//! Route statistics and the day-complete condition.

use serde::Serialize;

use crate::haversine::StraightLineEstimator;
use crate::order::{Coordinate, Order};
use crate::traits::DrivingSummary;

/// Where the distance and time figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    #[default]
    StraightLine,
    Driving,
}

/// Aggregates over the open part of a route. Completed orders only count.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteStats {
    /// Start through every open order, no return leg.
    pub total_distance_km: f64,
    /// Start to the first open order.
    pub next_distance_km: f64,
    pub total_travel_secs: i32,
    pub next_travel_secs: i32,
    pub open_count: usize,
    pub completed_count: usize,
    pub source: EstimateSource,
}

impl RouteStats {
    /// Every order is done and there was at least one.
    pub fn is_route_complete(&self) -> bool {
        self.open_count == 0 && self.completed_count > 0
    }

    /// Straight-line estimate for `route`, available immediately.
    pub fn straight_line(start: Coordinate, route: &[&Order], estimator: &StraightLineEstimator) -> Self {
        let (open, completed): (Vec<&Order>, Vec<&Order>) =
            route.iter().copied().partition(|order| !order.is_completed());

        let mut stats = RouteStats {
            open_count: open.len(),
            completed_count: completed.len(),
            ..RouteStats::default()
        };

        let Some(first) = open.first() else {
            return stats;
        };

        let next_km = estimator.road_km(start, first.coords);
        let total_km = open
            .windows(2)
            .fold(next_km, |sum, pair| sum + estimator.road_km(pair[0].coords, pair[1].coords));

        stats.next_distance_km = next_km;
        stats.next_travel_secs = estimator.km_to_seconds(next_km);
        stats.total_distance_km = total_km;
        stats.total_travel_secs = estimator.km_to_seconds(total_km);
        stats
    }

    /// Replace the estimate with driving-service figures, keeping the counts.
    pub fn refined(&self, next: &DrivingSummary, total: &DrivingSummary) -> Self {
        RouteStats {
            total_distance_km: total.distance_km(),
            next_distance_km: next.distance_km(),
            total_travel_secs: total.duration_secs(),
            next_travel_secs: next.duration_secs(),
            source: EstimateSource::Driving,
            ..self.clone()
        }
    }
}

/// Start followed by every open order, in route order.
pub fn open_waypoints(start: Coordinate, route: &[&Order]) -> Vec<Coordinate> {
    std::iter::once(start)
        .chain(route.iter().filter(|order| !order.is_completed()).map(|order| order.coords))
        .collect()
}
