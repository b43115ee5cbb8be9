//! Per-tick read-only summary of engine state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rail_core::{Direction, FeatureKey, LineId, TrainId};
use rail_service::TrainState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainSnapshot {
    pub id: TrainId,
    pub line: LineId,
    pub line_key: FeatureKey,
    /// `[lng, lat]`.
    pub coordinates: [f64; 2],
    pub distance_m: f64,
    pub speed_mps: f64,
    pub direction: Direction,
    pub state: TrainState,
    pub passengers: usize,
    pub load_factor: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub sim_time_secs: f64,
    pub day: u64,
    pub hour: u32,
    pub minute: u32,
    pub running: bool,

    pub trains: Vec<TrainSnapshot>,
    /// Waiting passengers per station; stations with an empty queue are
    /// omitted.
    pub station_queues: BTreeMap<FeatureKey, usize>,
    pub waiting_passengers: usize,

    /// Completed trips since the engine started.
    pub total_ridership: u64,
    pub completed_today: u64,
    pub abandoned_trips: u64,
    /// Mean spawn-to-arrival seconds over completed trips.
    pub average_wait_secs: f64,
    pub daily_station_ridership: BTreeMap<FeatureKey, u64>,
    pub daily_line_ridership: BTreeMap<FeatureKey, u64>,

    pub budget: f64,
    pub cashflow_per_hour: f64,
    pub total_revenue: f64,
    pub total_opex: f64,
    pub total_train_km: f64,

    pub active_incidents: usize,
}
