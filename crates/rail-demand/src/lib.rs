//! `rail-demand`: spatial demand, daily curve, and trip generation.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`grid`]    | `DemandCell`, `DemandGrid` (weighted sampling, generation) |
//! | [`profile`] | `HourlyProfile`: 24-hour demand multiplier curve          |
//! | [`model`]   | `DemandModel`, `DemandParams`, `GridSource`                |
//! | [`loader`]  | `load_grid_csv`, `load_grid_reader`                        |
//! | [`error`]   | `DemandError`, `DemandResult<T>`                           |
//!
//! # Trip model (summary)
//!
//! ```text
//! expected   = base_trips_per_hour × profile(hour) × tick_secs / 3600 + carry
//! trips      = floor(expected)          carry = expected − trips
//! origin     ~ grid cell weighted by demand, jittered inside the cell
//! destination~ independent draw from the same distribution
//! ```
//!
//! The fractional carry makes low per-tick rates add up exactly over time
//! instead of rounding to zero every tick.

pub mod error;
pub mod grid;
pub mod loader;
pub mod model;
pub mod profile;


pub use error::{DemandError, DemandResult};
pub use grid::{DemandCell, DemandGrid, GridGenParams, MAX_GENERATED_CELLS};
pub use loader::{load_grid_csv, load_grid_reader};
pub use model::{DemandModel, DemandParams, GridSource};
pub use profile::HourlyProfile;
