//! `rail-service`: everything that moves: trains, passengers, queues.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`train`]      | `SimTrain`, `TrainState`, `TrainParams`, even spawning      |
//! | [`passenger`]  | `Passenger`: one trip, lazily routed                       |
//! | [`queues`]     | `StationQueues`: FIFO boarding queue per station           |
//! | [`kinematics`] | `step_train`: Moving/Dwelling state machine                |
//! | [`exchange`]   | `exchange`: alight, board, and dwell at a station          |
//!
//! # Per-tick flow (driven by rail-sim)
//!
//! ```text
//! for train in trains:
//!     outcome = step_train(train, line, params, speed_cap, dt)
//!     if let Some(arrival) = outcome.arrival:
//!         report = exchange(train, arrival.station, queues, ctx)
//! ```
//!
//! Nothing here is fallible: a passenger without a route stays queued, a
//! full train leaves the rest of the queue in place.

pub mod exchange;
pub mod kinematics;
pub mod passenger;
pub mod queues;
pub mod train;

#[cfg(test)]
mod tests;

pub use exchange::{CompletedTrip, ExchangeContext, ExchangeParams, ExchangeReport, exchange};
pub use kinematics::{Arrival, KinematicsParams, StepOutcome, step_train};
pub use passenger::Passenger;
pub use queues::StationQueues;
pub use train::{SimTrain, TrainParams, TrainState, spawn_line_trains};
