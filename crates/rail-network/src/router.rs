//! Routing trait and default uniform-cost implementation.
//!
//! # Pluggability
//!
//! The engine calls routing through the [`Router`] trait, so applications
//! can swap in a schedule-aware or transfer-minimizing planner without
//! touching the tick loop.  The default [`UniformCostRouter`] minimizes total
//! ride distance.
//!
//! # Cost model
//!
//! Search cost is along-line distance in whole centimetres (`u64`), which
//! keeps the heap ordering exact.  Leg distances reported on the [`Route`]
//! are computed from the `f64` stop distances, not from the integer cost.
//!
//! Time estimates are deliberately flat: ride time is distance over a
//! nominal cruise speed, and every boarding adds a fixed transfer penalty
//! standing in for the average headway wait.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use rail_core::{Direction, GeoPoint, LineId, StationId};

use crate::network::RailNetwork;

// ── Route ─────────────────────────────────────────────────────────────────────

/// One uninterrupted ride on a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub line: LineId,
    pub from: StationId,
    pub to: StationId,
    pub from_distance_m: f64,
    pub to_distance_m: f64,
    /// `|to_distance_m - from_distance_m|`.
    pub distance_m: f64,
    /// Direction a train must be heading to carry this leg.
    pub direction: Direction,
    pub ride_time_secs: f64,
    /// Polyline slice between the two stops, in travel order.
    pub path: Vec<GeoPoint>,
}

/// The result of a routing query.
///
/// Consecutive legs share a station: `legs[i].to == legs[i + 1].from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<Leg>,
    pub distance_m: f64,
    pub ride_time_secs: f64,
    /// `legs.len() × transfer_penalty_secs`.
    pub wait_time_secs: f64,
    pub total_time_secs: f64,
}

impl Route {
    /// The route from a station to itself.
    pub fn trivial() -> Self {
        Route { legs: vec![], distance_m: 0.0, ride_time_secs: 0.0, wait_time_secs: 0.0, total_time_secs: 0.0 }
    }

    /// `true` if the source and destination are the same station.
    pub fn is_trivial(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    #[inline]
    pub fn leg(&self, index: usize) -> Option<&Leg> {
        self.legs.get(index)
    }

    /// Total along-line distance in kilometres, the fare basis.
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1_000.0
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// Returns `None` if no path exists; `from == to` yields a trivial route.
    fn route(&self, network: &RailNetwork, from: StationId, to: StationId) -> Option<Route>;
}

/// Speed and penalty constants for time estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterParams {
    /// Cruise speed used to turn leg distance into ride time.  Default 15 m/s.
    pub nominal_speed_mps: f64,
    /// Flat wait added per boarding.  Default 300 s.
    pub transfer_penalty_secs: f64,
}

impl Default for RouterParams {
    fn default() -> Self {
        Self { nominal_speed_mps: 15.0, transfer_penalty_secs: 300.0 }
    }
}

// ── UniformCostRouter ─────────────────────────────────────────────────────────

/// Dijkstra over the station graph, minimizing ride distance.
#[derive(Debug, Clone, Default)]
pub struct UniformCostRouter {
    pub params: RouterParams,
}

impl UniformCostRouter {
    pub fn new(params: RouterParams) -> Self {
        Self { params }
    }
}

impl Router for UniformCostRouter {
    fn route(&self, network: &RailNetwork, from: StationId, to: StationId) -> Option<Route> {
        find_route(network, from, to, &self.params)
    }
}

// ── Search internals ──────────────────────────────────────────────────────────

/// How a station was first reached on the best known path.
#[derive(Copy, Clone)]
struct Hop {
    prev: StationId,
    line: LineId,
}

#[inline]
fn cost_cm(metres: f64) -> u64 {
    (metres.abs() * 100.0).round() as u64
}

/// Uniform-cost search from `from` to `to`.
///
/// Every pair of stops on a serviceable line is an edge.  Heap ties are
/// broken by push order, and a station is expanded at most once.
pub fn find_route(
    network: &RailNetwork,
    from:    StationId,
    to:      StationId,
    params:  &RouterParams,
) -> Option<Route> {
    let n = network.station_count();
    if from.index() >= n || to.index() >= n {
        return None;
    }
    if from == to {
        return Some(Route::trivial());
    }

    let mut dist    = vec![u64::MAX; n];
    let mut hop     = vec![None::<Hop>; n];
    let mut settled = vec![false; n];

    // Min-heap on (cost, push sequence).
    let mut seq = 0u64;
    let mut heap: BinaryHeap<Reverse<(u64, u64, StationId)>> = BinaryHeap::new();
    dist[from.index()] = 0;
    heap.push(Reverse((0, seq, from)));

    while let Some(Reverse((cost, _, station))) = heap.pop() {
        if settled[station.index()] {
            continue;
        }
        settled[station.index()] = true;

        if station == to {
            return Some(reconstruct(network, &hop, from, to, params));
        }

        for &line_id in &network.stations[station.index()].lines {
            let Some(line) = network.line(line_id) else { continue };
            if !line.is_serviceable() {
                continue;
            }
            let Some(here) = line.stop_distance(station) else { continue };

            for stop in &line.stops {
                let next = stop.station;
                if next == station || settled[next.index()] {
                    continue;
                }
                let new_cost = cost.saturating_add(cost_cm(stop.distance_m - here));
                if new_cost < dist[next.index()] {
                    dist[next.index()] = new_cost;
                    hop[next.index()] = Some(Hop { prev: station, line: line_id });
                    seq += 1;
                    heap.push(Reverse((new_cost, seq, next)));
                }
            }
        }
    }

    None
}

fn reconstruct(
    network: &RailNetwork,
    hop:     &[Option<Hop>],
    from:    StationId,
    to:      StationId,
    params:  &RouterParams,
) -> Route {
    // Walk back to the origin collecting (prev, station, line).
    let mut hops = Vec::new();
    let mut cur = to;
    while cur != from {
        let Some(h) = hop[cur.index()] else { break };
        hops.push((h.prev, cur, h.line));
        cur = h.prev;
    }
    hops.reverse();

    let mut legs: Vec<Leg> = Vec::with_capacity(hops.len());
    for (a, b, line_id) in hops {
        let Some(line) = network.line(line_id) else { continue };
        let (Some(da), Some(db)) = (line.stop_distance(a), line.stop_distance(b)) else { continue };
        let direction = Direction::between(da, db);

        // Two hops on the same line in the same direction are one ride.
        if let Some(last) = legs.last_mut() {
            if last.line == line_id && last.direction == direction && last.to == a {
                last.to = b;
                last.to_distance_m = db;
                continue;
            }
        }
        legs.push(Leg {
            line: line_id,
            from: a,
            to: b,
            from_distance_m: da,
            to_distance_m: db,
            distance_m: 0.0,
            direction,
            ride_time_secs: 0.0,
            path: Vec::new(),
        });
    }

    let speed = params.nominal_speed_mps.max(f64::EPSILON);
    let mut distance_m = 0.0;
    let mut ride_time_secs = 0.0;
    for leg in &mut legs {
        leg.distance_m = (leg.to_distance_m - leg.from_distance_m).abs();
        leg.ride_time_secs = leg.distance_m / speed;
        leg.path = network
            .line(leg.line)
            .map(|l| l.slice_between(leg.from_distance_m, leg.to_distance_m))
            .unwrap_or_default();
        distance_m += leg.distance_m;
        ride_time_secs += leg.ride_time_secs;
    }

    let wait_time_secs = legs.len() as f64 * params.transfer_penalty_secs;
    Route {
        legs,
        distance_m,
        ride_time_secs,
        wait_time_secs,
        total_time_secs: ride_time_secs + wait_time_secs,
    }
}
