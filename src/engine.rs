//! Planning-session state and the caller-facing recalculation API.
//!
//! Every change produces a [`RoutePlan`] synchronously from straight-line
//! estimates. When a driving oracle is configured, a refinement job is then
//! spawned on a small rayon pool owned by the engine, kept apart from the
//! global pool because oracle calls block on HTTP. Its answer is tagged with the
//! [`RouteSignature`] of the input it was computed for, and is applied only
//! while that signature is still current. Refinements are applied when the
//! caller pumps the engine, so a plan is always observed before its
//! refinement.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_REFINEMENT_THREADS, EngineConfig};
use crate::error::{EngineError, OracleError};
use crate::haversine::StraightLineEstimator;
use crate::order::{Coordinate, Order, OrderId, OrderStatus};
use crate::route::Route;
use crate::stats::{RouteStats, open_waypoints};
use crate::strategy::{
    RouteStrategy, build_manual_route, build_optimal_route, build_priority_route, build_time_route,
};
use crate::traits::{DrivingOracle, DrivingSummary};

/// Identifies the input a set of statistics answers: the start point and the
/// open stops in visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RouteSignature(u64);

impl RouteSignature {
    fn of(start: Coordinate, route: &[&Order]) -> Self {
        let mut hasher = DefaultHasher::new();
        hash_coordinate(start, &mut hasher);
        for order in route.iter().filter(|order| !order.is_completed()) {
            order.id.hash(&mut hasher);
            hash_coordinate(order.coords, &mut hasher);
        }
        Self(hasher.finish())
    }
}

fn hash_coordinate(coord: Coordinate, hasher: &mut DefaultHasher) {
    coord.lat.to_bits().hash(hasher);
    coord.lng.to_bits().hash(hasher);
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub start: Coordinate,
    pub strategy: RouteStrategy,
    pub route: Vec<Order>,
    pub stats: RouteStats,
    pub signature: RouteSignature,
}

impl RoutePlan {
    pub fn is_route_complete(&self) -> bool {
        self.stats.is_route_complete()
    }

    pub fn route_ids(&self) -> Vec<OrderId> {
        self.route.iter().map(|order| order.id.clone()).collect()
    }
}

/// Notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Driving-service figures replaced the straight-line estimate.
    StatsRefined(RouteStats),
    /// Every order of the session is completed.
    RouteComplete,
    /// The driving service failed; the straight-line estimate stands.
    OracleAdvisory { message: String },
}

/// What happened to a refinement response.
#[derive(Debug, Clone, PartialEq)]
pub enum RefinementOutcome {
    Applied(RouteStats),
    Unavailable { message: String },
    /// The input changed while the request was in flight.
    Stale { signature: RouteSignature },
}

/// Background request for driving figures.
#[derive(Debug, Clone)]
pub struct RefinementJob {
    pub signature: RouteSignature,
    /// Start followed by every open order.
    pub waypoints: Vec<Coordinate>,
}

/// Answer to a [`RefinementJob`].
#[derive(Debug)]
pub struct RefinementResponse {
    pub signature: RouteSignature,
    pub result: Result<(DrivingSummary, DrivingSummary), OracleError>,
}

impl RefinementJob {
    /// Fetch the next leg and the whole route.
    pub fn run(self, oracle: &dyn DrivingOracle) -> RefinementResponse {
        let result = match self.waypoints.as_slice() {
            // A single leg is the whole route.
            [_, _] => oracle
                .fetch_driving_route(&self.waypoints)
                .map(|summary| (summary.clone(), summary)),
            [from, to, ..] => oracle
                .fetch_driving_leg(*from, *to)
                .and_then(|next| oracle.fetch_driving_route(&self.waypoints).map(|total| (next, total))),
            _ => Err(OracleError::TooFewWaypoints {
                count: self.waypoints.len(),
            }),
        };

        RefinementResponse {
            signature: self.signature,
            result,
        }
    }
}

type Listener = Box<dyn FnMut(&EngineEvent) + Send>;

#[derive(Debug, Default)]
struct Session {
    initialized: bool,
    start: Coordinate,
    strategy: RouteStrategy,
    /// Working set in supply order.
    orders: Vec<Order>,
    /// Orders rejected this session, kept so `reopen` can restore them.
    rejected: Vec<Order>,
    route: Route,
    last_optimal: Option<Vec<OrderId>>,
    stats: RouteStats,
    signature: RouteSignature,
}

impl Session {
    fn order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|order| order.id == *id)
    }

    fn open_orders(&self) -> Vec<Order> {
        self.orders.iter().filter(|order| !order.is_completed()).cloned().collect()
    }

    fn optimal_ids(&mut self, open: &[Order]) -> Vec<OrderId> {
        let ids: Vec<OrderId> = build_optimal_route(self.start, open)
            .into_iter()
            .map(|order| order.id.clone())
            .collect();
        self.last_optimal = Some(ids.clone());
        ids
    }

    /// Reorder the open orders with the active strategy; completed orders follow.
    fn rebuild(&mut self, manual_seed: Option<Vec<OrderId>>) {
        let open = self.open_orders();
        let ordered: Vec<OrderId> = match self.strategy {
            RouteStrategy::Optimal => self.optimal_ids(&open),
            RouteStrategy::Priority => ids_of(build_priority_route(&open)),
            RouteStrategy::Time => ids_of(build_time_route(&open)),
            RouteStrategy::Manual => {
                let seed = match manual_seed.or_else(|| self.last_optimal.clone()) {
                    Some(seed) => seed,
                    None => self.optimal_ids(&open),
                };
                ids_of(build_manual_route(&seed, &open))
            }
        };

        let completed = self.orders.iter().filter(|order| order.is_completed());
        let route = Route::from_orders(
            ordered
                .iter()
                .filter_map(|id| self.orders.iter().find(|order| order.id == *id))
                .chain(completed),
        );
        debug!(strategy = ?self.strategy, stops = route.len(), "route rebuilt");
        self.route = route;
    }
}

fn ids_of(route: Vec<&Order>) -> Vec<OrderId> {
    route.into_iter().map(|order| order.id.clone()).collect()
}

/// One planning session: working set, route, stats and pending refinements.
pub struct RouteEngine {
    estimator: StraightLineEstimator,
    oracle: Option<Arc<dyn DrivingOracle>>,
    refinement_threads: usize,
    /// Built on first dispatch.
    pool: Option<ThreadPool>,
    session: Session,
    listeners: Vec<Listener>,
    sender: Sender<RefinementResponse>,
    receiver: Receiver<RefinementResponse>,
    in_flight: usize,
}

impl Default for RouteEngine {
    fn default() -> Self {
        Self::new(StraightLineEstimator::default())
    }
}

impl RouteEngine {
    /// Engine with straight-line estimates only.
    pub fn new(estimator: StraightLineEstimator) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            estimator,
            oracle: None,
            refinement_threads: DEFAULT_REFINEMENT_THREADS,
            pool: None,
            session: Session::default(),
            listeners: Vec::new(),
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, OracleError> {
        let mut engine = Self::new(config.estimator());
        engine.oracle = config.oracle.build()?;
        engine.refinement_threads = config.refinement_threads.max(1);
        Ok(engine)
    }

    /// Refine estimates through `oracle`.
    pub fn with_oracle(mut self, oracle: Arc<dyn DrivingOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn strategy(&self) -> RouteStrategy {
        self.session.strategy
    }

    pub fn stats(&self) -> &RouteStats {
        &self.session.stats
    }

    pub fn signature(&self) -> RouteSignature {
        self.session.signature
    }

    /// Refinements dispatched and not yet received.
    pub fn pending_refinements(&self) -> usize {
        self.in_flight
    }

    pub fn plan(&self) -> RoutePlan {
        RoutePlan {
            start: self.session.start,
            strategy: self.session.strategy,
            route: self
                .session
                .route
                .resolve(&self.session.orders)
                .into_iter()
                .cloned()
                .collect(),
            stats: self.session.stats.clone(),
            signature: self.session.signature,
        }
    }

    /// Replace the session input and rebuild as needed.
    ///
    /// Identical input with the active strategy is a no-op. Identical input
    /// with a new strategy only switches strategy. New input rebuilds from
    /// scratch; under the manual strategy that means a fresh optimal seed.
    pub fn recompute(&mut self, start: Coordinate, orders: Vec<Order>, strategy: RouteStrategy) -> RoutePlan {
        let (orders, rejected) = working_set(orders);

        if self.session.initialized && self.session.start == start && self.session.orders == orders {
            for order in rejected {
                if !self.session.rejected.iter().any(|stashed| stashed.id == order.id) {
                    self.session.rejected.push(order);
                }
            }
            return self.set_strategy(strategy);
        }

        self.session = Session {
            initialized: true,
            start,
            strategy,
            orders,
            rejected,
            ..Session::default()
        };
        self.session.rebuild(None);
        self.refresh();
        self.plan()
    }

    /// Switch strategy over the current working set.
    pub fn set_strategy(&mut self, strategy: RouteStrategy) -> RoutePlan {
        if self.session.strategy == strategy && self.session.initialized {
            return self.plan();
        }
        self.session.initialized = true;
        self.session.strategy = strategy;
        self.session.rebuild(None);
        self.refresh();
        self.plan()
    }

    pub fn move_up(&mut self, id: &OrderId) -> Result<RoutePlan, EngineError> {
        self.ensure_manual()?;
        self.session.route.move_up(id)?;
        self.refresh();
        Ok(self.plan())
    }

    pub fn move_down(&mut self, id: &OrderId) -> Result<RoutePlan, EngineError> {
        self.ensure_manual()?;
        self.session.route.move_down(id)?;
        self.refresh();
        Ok(self.plan())
    }

    /// Drop an order from this session. It comes back if the caller supplies
    /// it again or reopens it.
    pub fn reject(&mut self, id: &OrderId) -> Result<RoutePlan, EngineError> {
        let index = self
            .session
            .orders
            .iter()
            .position(|order| order.id == *id)
            .ok_or_else(|| EngineError::UnknownOrderId(id.clone()))?;

        let mut order = self.session.orders.remove(index);
        order.status = OrderStatus::Rejected;
        self.session.rejected.push(order);
        self.session.route.remove(id);
        if let Some(seed) = self.session.last_optimal.as_mut() {
            seed.retain(|stop| stop != id);
        }
        debug!(order = %id, "order rejected");

        self.refresh();
        Ok(self.plan())
    }

    /// Mark an order completed. It keeps its place in the route.
    pub fn complete(&mut self, id: &OrderId) -> Result<RoutePlan, EngineError> {
        let order = self
            .session
            .order_mut(id)
            .ok_or_else(|| EngineError::UnknownOrderId(id.clone()))?;
        order.status = OrderStatus::Completed;

        self.refresh();
        Ok(self.plan())
    }

    /// Return a completed or rejected order to the open set and rebuild.
    pub fn reopen(&mut self, id: &OrderId) -> Result<RoutePlan, EngineError> {
        if let Some(order) = self.session.order_mut(id) {
            if !order.is_completed() {
                return Ok(self.plan());
            }
            order.status = OrderStatus::Open;
        } else {
            let index = self
                .session
                .rejected
                .iter()
                .position(|order| order.id == *id)
                .ok_or_else(|| EngineError::UnknownOrderId(id.clone()))?;
            let mut order = self.session.rejected.remove(index);
            order.status = OrderStatus::Open;
            self.session.orders.push(order);
        }

        let seed = (self.session.strategy == RouteStrategy::Manual).then(|| self.session.route.ids().to_vec());
        self.session.rebuild(seed);
        self.refresh();
        Ok(self.plan())
    }

    /// Apply every refinement that has already arrived, without blocking.
    pub fn poll_refinements(&mut self) -> Vec<RefinementOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(response) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            outcomes.push(self.apply_refinement(response));
        }
        outcomes
    }

    /// Block until the next refinement arrives and apply it.
    ///
    /// Returns `None` when nothing is in flight or `timeout` expires.
    pub fn wait_for_refinement(&mut self, timeout: Duration) -> Option<RefinementOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(response) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(self.apply_refinement(response))
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Apply a response if it still answers the current input.
    pub fn apply_refinement(&mut self, response: RefinementResponse) -> RefinementOutcome {
        if response.signature != self.session.signature {
            debug!(
                response = ?response.signature,
                current = ?self.session.signature,
                "stale refinement discarded"
            );
            return RefinementOutcome::Stale {
                signature: response.signature,
            };
        }

        match response.result {
            Ok((next, total)) => {
                let stats = self.session.stats.refined(&next, &total);
                self.session.stats = stats.clone();
                self.emit(&EngineEvent::StatsRefined(stats.clone()));
                RefinementOutcome::Applied(stats)
            }
            Err(err) => {
                warn!(error = %err, "driving oracle unavailable, keeping straight-line estimate");
                let message = err.to_string();
                self.emit(&EngineEvent::OracleAdvisory {
                    message: message.clone(),
                });
                RefinementOutcome::Unavailable { message }
            }
        }
    }

    fn ensure_manual(&self) -> Result<(), EngineError> {
        if self.session.strategy != RouteStrategy::Manual {
            return Err(EngineError::InvalidStrategyOperation {
                strategy: self.session.strategy,
            });
        }
        Ok(())
    }

    /// Straight-line stats now, driving figures later.
    fn refresh(&mut self) {
        let was_complete = self.session.stats.is_route_complete();

        let (stats, signature, waypoints) = {
            let route = self.session.route.resolve(&self.session.orders);
            (
                RouteStats::straight_line(self.session.start, &route, &self.estimator),
                RouteSignature::of(self.session.start, &route),
                open_waypoints(self.session.start, &route),
            )
        };
        self.session.stats = stats;
        self.session.signature = signature;

        if self.session.stats.is_route_complete() && !was_complete {
            info!(completed = self.session.stats.completed_count, "all orders completed");
            self.emit(&EngineEvent::RouteComplete);
        }

        if waypoints.len() >= 2 {
            self.dispatch(RefinementJob { signature, waypoints });
        }
    }

    fn dispatch(&mut self, job: RefinementJob) {
        let Some(oracle) = self.oracle.as_ref().map(Arc::clone) else {
            return;
        };
        if self.pool.is_none() {
            match refinement_pool(self.refinement_threads) {
                Ok(pool) => self.pool = Some(pool),
                Err(err) => {
                    warn!(error = %err, "refinement pool unavailable, keeping straight-line estimate");
                    self.emit(&EngineEvent::OracleAdvisory {
                        message: format!("refinement pool unavailable: {err}"),
                    });
                    return;
                }
            }
        }
        let Some(pool) = self.pool.as_ref() else {
            return;
        };

        let sender = self.sender.clone();
        debug!(signature = ?job.signature, waypoints = job.waypoints.len(), "dispatching refinement");

        self.in_flight += 1;
        pool.spawn(move || {
            let signature = job.signature;
            let service = oracle.name();
            let response = panic::catch_unwind(AssertUnwindSafe(|| job.run(oracle.as_ref()))).unwrap_or_else(|_| {
                error!(oracle = service, "driving oracle panicked");
                RefinementResponse {
                    signature,
                    result: Err(OracleError::Panicked { service }),
                }
            });
            if sender.send(response).is_err() {
                debug!("engine dropped before refinement arrived");
            }
        });
    }

    fn emit(&mut self, event: &EngineEvent) {
        for listener in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

fn refinement_pool(threads: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("route-refine-{index}"))
        .panic_handler(|_| error!("refinement worker panicked"))
        .build()
}

/// Split caller input into the working set and the rejected orders, dropping
/// duplicate ids.
fn working_set(orders: Vec<Order>) -> (Vec<Order>, Vec<Order>) {
    let mut seen = HashSet::new();
    orders
        .into_iter()
        .filter(|order| {
            let fresh = seen.insert(order.id.clone());
            if !fresh {
                warn!(order = %order.id, "duplicate order id ignored");
            }
            fresh
        })
        .partition(|order| order.status != OrderStatus::Rejected)
}
