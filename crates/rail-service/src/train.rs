//! Train state and spawning.

use serde::{Deserialize, Serialize};

use rail_core::{Direction, GeoPoint, LineId, TrainId};
use rail_network::Line;

use crate::Passenger;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrainState {
    #[default]
    Moving,
    Dwelling,
}

/// Fleet sizing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    /// Trains spawned on each serviceable line.  Default 2.
    pub trains_per_line: u32,
    /// Passengers per train.  Default 200.
    pub capacity: u32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self { trains_per_line: 2, capacity: 200 }
    }
}

/// One train running back and forth along a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTrain {
    pub id: TrainId,
    pub line: LineId,
    /// Position along the line, always within `[0, line.length_m]`.
    pub distance_m: f64,
    pub speed_mps: f64,
    pub direction: Direction,
    pub state: TrainState,
    pub dwell_remaining_secs: f64,
    /// Index into `line.stops` while dwelling at a stop.
    pub at_stop: Option<usize>,
    /// Index of the stop most recently served.  `None` until the first
    /// arrival, so a train spawned on a stop serves it before leaving.
    pub last_stop: Option<usize>,
    pub passengers: Vec<Passenger>,
    pub capacity: u32,
}

impl SimTrain {
    pub fn new(id: TrainId, line: LineId, distance_m: f64, capacity: u32) -> Self {
        Self {
            id,
            line,
            distance_m,
            speed_mps: 0.0,
            direction: Direction::Forward,
            state: TrainState::Moving,
            dwell_remaining_secs: 0.0,
            at_stop: None,
            last_stop: None,
            passengers: Vec::new(),
            capacity,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.passengers.len() >= self.capacity as usize
    }

    #[inline]
    pub fn spare_capacity(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.passengers.len())
    }

    /// Onboard count over capacity, in `[0, 1]`.  A zero-capacity train
    /// reports `0`.
    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.passengers.len() as f64 / self.capacity as f64).min(1.0)
    }

    /// Map position on `line`.
    pub fn position(&self, line: &Line) -> Option<GeoPoint> {
        line.position_at(self.distance_m)
    }
}

/// Spawn `params.trains_per_line` trains evenly spaced along `line`, the
/// first at distance 0.  Ids are drawn from `next_id`, which is advanced.
///
/// A train placed on a stop arrives there on its first step.
///
/// Unserviceable lines get no trains.
pub fn spawn_line_trains(line: &Line, params: &TrainParams, next_id: &mut u32) -> Vec<SimTrain> {
    if !line.is_serviceable() || params.trains_per_line == 0 {
        return Vec::new();
    }
    let count = params.trains_per_line;
    let spacing = line.length_m / count as f64;
    (0..count)
        .map(|i| {
            let id = TrainId(*next_id);
            *next_id += 1;
            SimTrain::new(id, line.id, (spacing * i as f64).min(line.length_m), params.capacity)
        })
        .collect()
}
