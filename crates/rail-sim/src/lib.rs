//! `rail-sim`: tick scheduler and host boundary for the rail operations
//! simulator.
//!
//! # Tick order
//!
//! ```text
//! every tick:
//!   ① Clock    : advance; a new day resets daily ridership.
//!   ② Demand   : spawn passengers from the demand grid into the queue of
//!                 the nearest station.
//!   ③ Trains   : move along their lines; arrivals alight, transfer,
//!                 board, and set the dwell.  Completed trips pay fares.
//!   ④ Abandon  : drop passengers queued past the residency limit.
//!   ⑤ Economics: opex, hourly cashflow window, budget floor.
//!   ⑥ Incidents: roll on accumulated train-km, expire the finished ones.
//!   ⑦ Snapshot : a `Tick` event every `snapshot_interval_ticks`.
//! ```
//!
//! Commands are applied between ticks by [`Engine::handle`], which returns
//! the events they produce.  A timer-driven host ([`spawn_host`]) ticks
//! only while the engine is running.
//!
//! # Modules
//!
//! | Module       | Contents                                             |
//! |--------------|------------------------------------------------------|
//! | `config`     | `EngineConfig` and per-subsystem parameter structs   |
//! | `commands`   | `Command`, the host → engine wire enum               |
//! | `events`     | `Event`, the engine → host wire enum, and payloads   |
//! | `economics`  | Budget, fares, opex, cashflow                        |
//! | `incidents`  | Speed caps and extra dwell, paced by train-km        |
//! | `ridership`  | Completed, abandoned, and daily per-key tallies      |
//! | `snapshot`   | Per-tick read-only state summary                     |
//! | `host`       | Threaded timer loop over `mpsc` channels             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rail_sim::{Command, EngineBuilder, EngineConfig, NoopObserver};
//!
//! let mut engine = EngineBuilder::with_default_router(EngineConfig::default())
//!     .network(description)
//!     .build()?;
//! engine.handle(Command::Start);
//! engine.run(&mut NoopObserver);
//! ```

pub mod builder;
pub mod commands;
pub mod config;
pub mod economics;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod incidents;
pub mod observer;
pub mod ridership;
pub mod snapshot;


pub use builder::EngineBuilder;
pub use commands::Command;
pub use config::{EconomicsParams, EngineConfig, IncidentParams, NetworkParams, WalkParams};
pub use economics::{EconomicsLedger, EconomicsState};
pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use events::{
    DemandDetails, Event, IncidentTransition, JourneyPlan, LineSummary, NearbyStation,
    NetworkSummary, StationRef,
};
pub use host::{HostHandle, HostMessage, spawn_host};
pub use incidents::{Incident, IncidentKind, IncidentManager, IncidentTarget};
pub use observer::{NoopObserver, SimObserver};
pub use ridership::RidershipStats;
pub use snapshot::{Snapshot, TrainSnapshot};
