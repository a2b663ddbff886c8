//! Ordered visiting sequence.

use crate::error::EngineError;
use crate::order::{Order, OrderId};

/// Order ids in visiting order. Never holds the same id twice; the start
/// point is implicit and not a member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    stops: Vec<OrderId>,
}

impl Route {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut route = Self::default();
        for order in orders {
            if !route.contains(&order.id) {
                route.stops.push(order.id.clone());
            }
        }
        route
    }

    pub fn ids(&self) -> &[OrderId] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.stops.contains(id)
    }

    fn position(&self, id: &OrderId) -> Result<usize, EngineError> {
        self.stops
            .iter()
            .position(|stop| stop == id)
            .ok_or_else(|| EngineError::UnknownOrderId(id.clone()))
    }

    /// Swap with the previous stop. No-op for the first stop.
    pub fn move_up(&mut self, id: &OrderId) -> Result<(), EngineError> {
        let index = self.position(id)?;
        if index > 0 {
            self.stops.swap(index - 1, index);
        }
        Ok(())
    }

    /// Swap with the next stop. No-op for the last stop.
    pub fn move_down(&mut self, id: &OrderId) -> Result<(), EngineError> {
        let index = self.position(id)?;
        if index + 1 < self.stops.len() {
            self.stops.swap(index, index + 1);
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &OrderId) -> bool {
        let before = self.stops.len();
        self.stops.retain(|stop| stop != id);
        self.stops.len() != before
    }

    /// Resolve ids against the working set, in route order.
    pub fn resolve<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        self.stops
            .iter()
            .filter_map(|id| orders.iter().find(|order| order.id == *id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(ids: &[&str]) -> Route {
        let orders: Vec<Order> = ids.iter().map(|id| Order::new(*id, (0.0, 0.0))).collect();
        Route::from_orders(&orders)
    }

    fn names(route: &Route) -> Vec<&str> {
        route.ids().iter().map(OrderId::as_str).collect()
    }

    #[test]
    fn test_from_orders_drops_duplicates() {
        let orders = vec![
            Order::new("a", (0.0, 0.0)),
            Order::new("a", (1.0, 1.0)),
            Order::new("b", (0.0, 0.0)),
        ];
        assert_eq!(names(&Route::from_orders(&orders)), vec!["a", "b"]);
    }

    #[test]
    fn test_move_up_and_down() {
        let mut r = route(&["a", "b", "c"]);
        r.move_up(&OrderId::from("c")).expect("known id");
        assert_eq!(names(&r), vec!["a", "c", "b"]);
        r.move_down(&OrderId::from("a")).expect("known id");
        assert_eq!(names(&r), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_boundary_moves_are_noops() {
        let mut r = route(&["a", "b", "c"]);
        r.move_up(&OrderId::from("a")).expect("known id");
        r.move_down(&OrderId::from("c")).expect("known id");
        assert_eq!(names(&r), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_id() {
        let mut r = route(&["a"]);
        assert_eq!(
            r.move_up(&OrderId::from("zz")),
            Err(EngineError::UnknownOrderId(OrderId::from("zz")))
        );
        assert_eq!(names(&r), vec!["a"]);
    }

    #[test]
    fn test_remove() {
        let mut r = route(&["a", "b"]);
        assert!(r.remove(&OrderId::from("a")));
        assert!(!r.remove(&OrderId::from("a")));
        assert_eq!(names(&r), vec!["b"]);
    }
}
