//! Munich locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap, rounded to four decimals.

#![allow(dead_code)]

use route_engine::{Coordinate, Order, Priority};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// An open, medium-priority order at this location.
    pub fn order(&self, id: u64) -> Order {
        let mut order = Order::new(id, self.coords()).with_customer(self.name);
        order.address = format!("{}, München", self.name);
        order
    }
}

// ============================================================================
// Depots (start locations)
// ============================================================================

pub const DEPOT_ISARTOR: Location = Location::new("Isartor", 48.1351, 11.5820);
pub const DEPOT_PASING: Location = Location::new("Pasing", 48.1497, 11.4614);

// ============================================================================
// Elevator sites around the city
// ============================================================================

pub const SITES: &[Location] = &[
    Location::new("Hauptbahnhof", 48.1402, 11.5586),
    Location::new("Sendlinger Tor", 48.1325, 11.5674),
    Location::new("Marienplatz", 48.1374, 11.5755),
    Location::new("Odeonsplatz", 48.1427, 11.5774),
    Location::new("Deutsches Museum", 48.1299, 11.5834),
    Location::new("Ostbahnhof", 48.1272, 11.6050),
    Location::new("Münchner Freiheit", 48.1622, 11.5867),
    Location::new("Olympiapark", 48.1731, 11.5466),
    Location::new("Allianz Arena", 48.2188, 11.6247),
];

/// Orders for every site, ids starting at 1 in site order.
pub fn site_orders() -> Vec<Order> {
    SITES
        .iter()
        .enumerate()
        .map(|(index, site)| site.order(index as u64 + 1))
        .collect()
}

/// The two-order morning used in most scenarios.
pub fn morning_orders() -> Vec<Order> {
    vec![
        SITES[0].order(1).with_priority(Priority::High),
        SITES[1].order(2).with_priority(Priority::Medium),
    ]
}
