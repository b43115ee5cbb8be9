//! Passenger exchange when a train stops at a station.
//!
//! Order matters:
//!
//! 1. **Alight** every passenger whose current leg ends here.  Passengers on
//!    their final leg complete their trip; the rest join this station's
//!    queue to wait for their next leg.
//! 2. **Board** from the front of the queue while the train has room.  A
//!    passenger without a route is routed now; one with no possible route
//!    stays queued.  Only passengers whose current leg rides this train's
//!    line in its departing direction get on.
//! 3. **Dwell** for `base + per_passenger × (alighted + boarded)` plus any
//!    extra dwell imposed on the station.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use rail_core::{LineId, PassengerId, StationId};
use rail_network::{RailNetwork, Router};

use crate::{Passenger, SimTrain, StationQueues, TrainState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeParams {
    /// Default 20 s.
    pub base_dwell_secs: f64,
    /// Default 1.5 s per alighting or boarding passenger.
    pub dwell_per_passenger_secs: f64,
}

impl Default for ExchangeParams {
    fn default() -> Self {
        Self { base_dwell_secs: 20.0, dwell_per_passenger_secs: 1.5 }
    }
}

/// Shared inputs for one exchange.
pub struct ExchangeContext<'a, R: Router + ?Sized> {
    pub network: &'a RailNetwork,
    pub router: &'a R,
    pub params: &'a ExchangeParams,
    pub now_secs: f64,
    /// Extra dwell from an incident at this station, seconds.
    pub extra_dwell_secs: f64,
}

/// A trip that ended at this stop.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedTrip {
    pub passenger: PassengerId,
    pub origin: StationId,
    pub destination: StationId,
    /// Line of every leg, in ride order.
    pub lines: Vec<LineId>,
    /// Σ leg distance, the fare basis.
    pub distance_km: f64,
    /// Spawn to arrival, simulated seconds.
    pub journey_secs: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExchangeReport {
    pub alighted: u32,
    pub boarded: u32,
    pub transferred: u32,
    pub completed: Vec<CompletedTrip>,
    pub dwell_secs: f64,
}

/// Run the exchange for `train` standing at `station`, and start its dwell.
pub fn exchange<R: Router + ?Sized>(
    train:   &mut SimTrain,
    station: StationId,
    queues:  &mut StationQueues,
    ctx:     &ExchangeContext<'_, R>,
) -> ExchangeReport {
    let mut report = ExchangeReport::default();

    // ── Alight ────────────────────────────────────────────────────────────
    let onboard = std::mem::take(&mut train.passengers);
    for mut p in onboard {
        let ends_here = p.current_leg().is_none_or(|leg| leg.to == station);
        if !ends_here {
            train.passengers.push(p);
            continue;
        }
        report.alighted += 1;

        if p.on_final_leg() || p.route.is_none() {
            if let Some(trip) = complete(p, ctx.now_secs) {
                report.completed.push(trip);
            }
        } else {
            p.leg_index += 1;
            p.queued_since_secs = ctx.now_secs;
            report.transferred += 1;
            queues.push(station, p);
        }
    }

    // ── Board ─────────────────────────────────────────────────────────────
    let mut queue = queues.take(station);
    let mut kept = VecDeque::with_capacity(queue.len());
    while let Some(mut p) = queue.pop_front() {
        if train.is_full() {
            kept.push_back(p);
            kept.extend(queue.drain(..));
            break;
        }
        if p.route.is_none() {
            p.route = ctx.router.route(ctx.network, station, p.destination);
        }
        let rides_this_train = p
            .current_leg()
            .is_some_and(|leg| leg.line == train.line && leg.from == station && leg.direction == train.direction);
        if rides_this_train {
            report.boarded += 1;
            train.passengers.push(p);
        } else {
            kept.push_back(p);
        }
    }
    queues.restore(station, kept);

    // ── Dwell ─────────────────────────────────────────────────────────────
    let handled = (report.alighted + report.boarded) as f64;
    report.dwell_secs = ctx.params.base_dwell_secs
        + ctx.params.dwell_per_passenger_secs * handled
        + ctx.extra_dwell_secs.max(0.0);
    train.state = TrainState::Dwelling;
    train.dwell_remaining_secs = report.dwell_secs;
    train.speed_mps = 0.0;

    report
}

fn complete(p: Passenger, now_secs: f64) -> Option<CompletedTrip> {
    let route = p.route?;
    Some(CompletedTrip {
        passenger: p.id,
        origin: p.origin,
        destination: p.destination,
        lines: route.legs.iter().map(|l| l.line).collect(),
        distance_km: route.distance_km(),
        journey_secs: (now_secs - p.spawned_at_secs).max(0.0),
    })
}
