//! Direction of travel along a line's cumulative-distance axis.

use serde::{Deserialize, Serialize};

/// `Forward` moves toward increasing cumulative distance, `Backward` toward 0.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// `+1.0` or `-1.0`, for integrating `distance += speed * dt * sign`.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward  => 1.0,
            Direction::Backward => -1.0,
        }
    }

    #[inline]
    pub fn reversed(self) -> Direction {
        match self {
            Direction::Forward  => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Direction needed to get from distance `from` to distance `to`.
    /// Equal distances count as `Forward`.
    #[inline]
    pub fn between(from: f64, to: f64) -> Direction {
        if to >= from { Direction::Forward } else { Direction::Backward }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Forward  => "forward",
            Direction::Backward => "backward",
        })
    }
}
