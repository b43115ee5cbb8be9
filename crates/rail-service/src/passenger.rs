//! A single passenger trip.

use serde::{Deserialize, Serialize};

use rail_core::{PassengerId, StationId};
use rail_network::{Leg, Route};

/// One trip from `origin` to `destination`.
///
/// A passenger lives in exactly one place at a time: a station queue or a
/// train's passenger list.  The route is attached the first time the
/// passenger is considered for boarding and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub origin: StationId,
    pub destination: StationId,
    pub route: Option<Route>,
    /// Index into `route.legs` of the leg being ridden or waited for.
    pub leg_index: usize,
    /// Simulated seconds at spawn.
    pub spawned_at_secs: f64,
    /// Simulated seconds at which the passenger joined its current queue.
    pub queued_since_secs: f64,
}

impl Passenger {
    pub fn new(id: PassengerId, origin: StationId, destination: StationId, now_secs: f64) -> Self {
        Self {
            id,
            origin,
            destination,
            route: None,
            leg_index: 0,
            spawned_at_secs: now_secs,
            queued_since_secs: now_secs,
        }
    }

    #[inline]
    pub fn current_leg(&self) -> Option<&Leg> {
        self.route.as_ref().and_then(|r| r.leg(self.leg_index))
    }

    /// `true` if the current leg is the last one of the route.
    pub fn on_final_leg(&self) -> bool {
        match &self.route {
            Some(r) => self.leg_index + 1 >= r.leg_count(),
            None => false,
        }
    }

    /// Simulated seconds spent in the current queue.
    #[inline]
    pub fn queued_for(&self, now_secs: f64) -> f64 {
        (now_secs - self.queued_since_secs).max(0.0)
    }
}
