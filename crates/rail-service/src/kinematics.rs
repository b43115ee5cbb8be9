//! Per-train Moving/Dwelling state machine.
//!
//! # Moving
//!
//! ```text
//! target   = next stop not yet served, else the line end in that direction
//! gap      = |target − distance|
//! braking  = v² / 2a
//! gap < braking  →  v = max(v − a·dt, 0)
//! otherwise      →  v = min(v + a·dt, min(max_speed, cap))
//! distance += v·dt·direction
//! ```
//!
//! A move that closes the gap to a stop snaps the train onto the stop and
//! stops it; the caller then runs the station exchange, which sets the
//! dwell.  Stops sharing one distance are reached one per step, in travel
//! order, with a zero-length move.  Reaching either line end clamps the
//! position and reverses.
//!
//! # Dwelling
//!
//! Dwell time counts down by `dt`.  When it reaches zero the train becomes
//! `Moving` again and departs on the following tick.

use serde::{Deserialize, Serialize};

use rail_core::{Direction, StationId};
use rail_network::Line;

use crate::{SimTrain, TrainState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsParams {
    /// Used for both acceleration and braking.  Default 1 m/s².
    pub acceleration_mps2: f64,
    /// Default 20 m/s.
    pub max_speed_mps: f64,
}

impl Default for KinematicsParams {
    fn default() -> Self {
        Self { acceleration_mps2: 1.0, max_speed_mps: 20.0 }
    }
}

/// A stop the train pulled into this tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Arrival {
    pub stop_index: usize,
    pub station: StationId,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    /// Distance covered this tick, metres.
    pub moved_m: f64,
    pub arrival: Option<Arrival>,
}

/// Advance `train` by one tick of `dt` seconds along `line`.
///
/// `speed_cap` is an active speed restriction on this train, if any.
pub fn step_train(
    train:     &mut SimTrain,
    line:      &Line,
    params:    &KinematicsParams,
    speed_cap: Option<f64>,
    dt:        f64,
) -> StepOutcome {
    if train.state == TrainState::Dwelling {
        train.speed_mps = 0.0;
        train.dwell_remaining_secs -= dt;
        if train.dwell_remaining_secs <= 0.0 {
            train.dwell_remaining_secs = 0.0;
            train.state = TrainState::Moving;
            train.last_stop = train.at_stop.take().or(train.last_stop);
        }
        return StepOutcome::default();
    }

    let length = line.length_m;
    train.distance_m = train.distance_m.clamp(0.0, length);

    let next = line.next_stop(train.distance_m, train.direction, train.last_stop);
    let target_m = match next {
        Some(i) => line.stops[i].distance_m,
        None => match train.direction {
            Direction::Forward => length,
            Direction::Backward => 0.0,
        },
    };
    let gap = (target_m - train.distance_m).abs();

    let accel = params.acceleration_mps2.max(f64::EPSILON);
    let braking = train.speed_mps * train.speed_mps / (2.0 * accel);
    let top = match speed_cap {
        Some(cap) => params.max_speed_mps.min(cap.max(0.0)),
        None => params.max_speed_mps,
    };

    if gap < braking {
        train.speed_mps = (train.speed_mps - accel * dt).max(0.0);
    } else {
        train.speed_mps = (train.speed_mps + accel * dt).min(top);
    }
    // A cap tighter than the current speed pulls the speed down at once.
    train.speed_mps = train.speed_mps.min(top).max(0.0);

    let step = train.speed_mps * dt;

    if let Some(i) = next {
        if step >= gap {
            let stop = line.stops[i];
            train.distance_m = stop.distance_m;
            train.speed_mps = 0.0;
            train.state = TrainState::Dwelling;
            train.at_stop = Some(i);
            train.last_stop = Some(i);
            // Reverse only once every stop at this end has been served.
            if line.is_at_end(stop.distance_m) && line.next_stop(stop.distance_m, train.direction, Some(i)).is_none() {
                train.direction = end_direction(stop.distance_m, length);
            }
            return StepOutcome { moved_m: gap, arrival: Some(Arrival { stop_index: i, station: stop.station }) };
        }
    }

    let before = train.distance_m;
    let after = before + step * train.direction.sign();
    if after <= 0.0 {
        train.distance_m = 0.0;
        train.direction = Direction::Forward;
        train.speed_mps = 0.0;
    } else if after >= length {
        train.distance_m = length;
        train.direction = Direction::Backward;
        train.speed_mps = 0.0;
    } else {
        train.distance_m = after;
    }

    StepOutcome { moved_m: (train.distance_m - before).abs(), arrival: None }
}

/// Direction a train leaves a line end in.
fn end_direction(distance_m: f64, length_m: f64) -> Direction {
    if distance_m <= length_m * 0.5 { Direction::Forward } else { Direction::Backward }
}
