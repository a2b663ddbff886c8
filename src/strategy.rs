//! Route ordering strategies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::haversine::haversine_km;
use crate::order::{Coordinate, Order, OrderId};

/// Rule used to order the open orders of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    /// Greedy nearest neighbour from the start position.
    #[default]
    Optimal,
    /// Highest priority first.
    Priority,
    /// Earliest planned start first.
    Time,
    /// User-controlled order, seeded from the last optimal route.
    Manual,
}

/// Greedy nearest-neighbour ordering.
///
/// From the current position, always visit the closest remaining order by
/// raw straight-line distance. Equal distances keep input order. O(n²), fine
/// for a day's worth of orders.
pub fn build_optimal_route(start: Coordinate, orders: &[Order]) -> Vec<&Order> {
    let mut pool: Vec<&Order> = orders.iter().collect();
    let mut route = Vec::with_capacity(pool.len());
    let mut current = start;

    while !pool.is_empty() {
        let mut best_index = 0;
        let mut best_km = f64::INFINITY;
        for (index, candidate) in pool.iter().enumerate() {
            let km = haversine_km(current, candidate.coords);
            if km < best_km {
                best_km = km;
                best_index = index;
            }
        }

        let next = pool.remove(best_index);
        current = next.coords;
        route.push(next);
    }

    route
}

/// Stable sort, High before Medium before Low.
pub fn build_priority_route(orders: &[Order]) -> Vec<&Order> {
    let mut route: Vec<&Order> = orders.iter().collect();
    route.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
    route
}

/// Stable sort by planned start. Orders without one go last.
pub fn build_time_route(orders: &[Order]) -> Vec<&Order> {
    let mut route: Vec<&Order> = orders.iter().collect();
    route.sort_by_key(|order| (order.planned_start.is_none(), order.planned_start));
    route
}

/// Follow `seed` for the orders it names, then append the rest in input order.
pub fn build_manual_route<'a>(seed: &[OrderId], orders: &'a [Order]) -> Vec<&'a Order> {
    let by_id: HashMap<&OrderId, &Order> = orders.iter().map(|order| (&order.id, order)).collect();

    let mut route: Vec<&Order> = Vec::with_capacity(orders.len());
    for id in seed {
        if let Some(order) = by_id.get(id) {
            if !route.iter().any(|placed| placed.id == *id) {
                route.push(*order);
            }
        }
    }
    for order in orders {
        if !seed.contains(&order.id) {
            route.push(order);
        }
    }

    route
}
