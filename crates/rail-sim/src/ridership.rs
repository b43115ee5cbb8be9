//! Trip counters: cumulative, and per-day by station and line.
//!
//! Daily tallies are keyed by external [`FeatureKey`] rather than by table
//! index, so they stay meaningful across network rebuilds within a day.

use std::collections::BTreeMap;

use rail_core::FeatureKey;
use rail_network::RailNetwork;
use rail_service::CompletedTrip;

#[derive(Debug, Default)]
pub struct RidershipStats {
    pub total_completed: u64,
    pub completed_today: u64,
    pub abandoned: u64,
    /// Σ spawn-to-arrival seconds over completed trips.
    total_journey_secs: f64,
    /// One count for the origin and one for the destination of every trip.
    pub daily_station: BTreeMap<FeatureKey, u64>,
    /// One count per leg.
    pub daily_line: BTreeMap<FeatureKey, u64>,
}

impl RidershipStats {
    pub fn record_completion(&mut self, trip: &CompletedTrip, network: &RailNetwork) {
        self.total_completed += 1;
        self.completed_today += 1;
        self.total_journey_secs += trip.journey_secs;

        for station in [trip.origin, trip.destination] {
            if let Some(s) = network.station(station) {
                *self.daily_station.entry(s.key.clone()).or_default() += 1;
            }
        }
        for &line in &trip.lines {
            if let Some(l) = network.line(line) {
                *self.daily_line.entry(l.key.clone()).or_default() += 1;
            }
        }
    }

    pub fn record_abandoned(&mut self, count: usize) {
        self.abandoned += count as u64;
    }

    /// Mean spawn-to-arrival time of completed trips, `0` before the first.
    pub fn average_wait_secs(&self) -> f64 {
        if self.total_completed == 0 {
            0.0
        } else {
            self.total_journey_secs / self.total_completed as f64
        }
    }

    pub fn reset_daily(&mut self) {
        self.completed_today = 0;
        self.daily_station.clear();
        self.daily_line.clear();
    }
}
