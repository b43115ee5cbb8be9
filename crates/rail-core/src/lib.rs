//! `rail-core`: foundational types for the rail operations simulator.
//!
//! This crate is a dependency of every other `rail-*` crate.  It has no
//! `rail-*` dependencies and only a handful of external ones (`rand`,
//! `serde`, `serde_json`).  Each sub-crate defines its own error enum.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `StationId`, `LineId`, `TrainId`, `PassengerId`, `IncidentId` |
//! | [`geo`]         | `GeoPoint`, haversine distance                             |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]         | `SimRng` (engine-wide deterministic RNG)                   |
//! | [`direction`]   | `Direction` of travel along a line                         |
//! | [`feature`]     | `FeatureKey`, `PointFeature`, `LineFeature`                |

pub mod direction;
pub mod feature;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use direction::Direction;
pub use feature::{FeatureId, FeatureKey, LineFeature, PointFeature, Properties};
pub use geo::GeoPoint;
pub use ids::{IncidentId, LineId, PassengerId, StationId, TrainId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
