//! Operating costs, fares, cashflow, and budget.
//!
//! # Cashflow
//!
//! Revenue and opex are summed over a window that restarts at every
//! simulated-hour rollover.  The cashflow rate is the window's net divided
//! by the window length (at least one tick), and the budget integrates that
//! rate every tick:
//!
//! ```text
//! cashflow/h = (window_revenue − window_opex) / max(window_hours, tick_hours)
//! budget    += cashflow/h × tick_hours
//! ```
//!
//! Construction costs bypass the rate and hit the budget at once.  The budget
//! never drops below `budget_floor`.

use serde::{Deserialize, Serialize};

use rail_core::time::SECS_PER_HOUR;

use crate::config::EconomicsParams;

/// Read-only view of the ledger for snapshots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomicsState {
    pub budget: f64,
    pub cashflow_per_hour: f64,
    pub window_revenue: f64,
    pub window_opex: f64,
    pub total_revenue: f64,
    pub total_opex: f64,
    pub total_train_km: f64,
}

pub struct EconomicsLedger {
    params: EconomicsParams,
    state: EconomicsState,
    /// Fares taken since the last `tick`.
    pending_revenue: f64,
    window_secs: f64,
    window_hour: Option<u64>,
}

impl EconomicsLedger {
    pub fn new(params: EconomicsParams) -> Self {
        let state = EconomicsState { budget: params.initial_budget, ..EconomicsState::default() };
        Self { params, state, pending_revenue: 0.0, window_secs: 0.0, window_hour: None }
    }

    #[inline]
    pub fn state(&self) -> &EconomicsState {
        &self.state
    }

    #[inline]
    pub fn budget(&self) -> f64 {
        self.state.budget
    }

    /// Take the fare for a trip of `distance_km`.  Returns the fare.
    pub fn collect_fare(&mut self, distance_km: f64) -> f64 {
        let fare = distance_km.max(0.0) * self.params.fare_per_km;
        self.pending_revenue += fare;
        fare
    }

    /// Pay a construction cost now.  Returns `true` if the floor was hit.
    pub fn build(&mut self, cost: f64) -> bool {
        if !cost.is_finite() {
            return false;
        }
        self.state.budget -= cost;
        self.clamp_to_floor()
    }

    /// Price a line from its length and station count.
    pub fn estimate_line_cost(&self, length_km: f64, stations: usize) -> f64 {
        length_km.max(0.0) * self.params.cost_per_track_km + stations as f64 * self.params.cost_per_station
    }

    /// Book one tick.  `hour_index` is the absolute simulated hour; a change
    /// restarts the cashflow window.  Returns `true` if the floor was hit.
    pub fn tick(&mut self, train_km: f64, station_count: usize, tick_secs: f64, hour_index: u64) -> bool {
        if self.window_hour != Some(hour_index) {
            self.window_hour = Some(hour_index);
            self.state.window_revenue = 0.0;
            self.state.window_opex = 0.0;
            self.window_secs = 0.0;
        }

        let tick_hours = tick_secs / SECS_PER_HOUR as f64;
        let opex = train_km * self.params.opex_per_train_km
            + station_count as f64 * self.params.opex_per_station_hour * tick_hours;
        let revenue = std::mem::take(&mut self.pending_revenue);

        self.state.window_revenue += revenue;
        self.state.window_opex += opex;
        self.state.total_revenue += revenue;
        self.state.total_opex += opex;
        self.state.total_train_km += train_km;
        self.window_secs += tick_secs;

        let window_hours = (self.window_secs / SECS_PER_HOUR as f64).max(tick_hours);
        self.state.cashflow_per_hour = if window_hours > 0.0 {
            (self.state.window_revenue - self.state.window_opex) / window_hours
        } else {
            0.0
        };
        self.state.budget += self.state.cashflow_per_hour * tick_hours;
        self.clamp_to_floor()
    }

    fn clamp_to_floor(&mut self) -> bool {
        if self.state.budget < self.params.budget_floor {
            self.state.budget = self.params.budget_floor;
            true
        } else {
            false
        }
    }
}
