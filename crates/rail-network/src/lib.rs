//! `rail-network`: station/line graph, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                         |
//! |-------------|------------------------------------------------------------------|
//! | [`network`] | `RailNetwork` (stations, lines, R-tree), `RailNetworkBuilder`,   |
//! |             | `NetworkDescription`                                             |
//! | [`router`]  | `Router` trait, `Route`, `Leg`, `UniformCostRouter`, `find_route`|
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                               |
//!
//! # Graph model
//!
//! Lines are polylines; stations are points.  A rebuild snaps every station
//! lying within `snap_threshold_m` of a line vertex onto that line, giving
//! each line an ordered list of stops with cumulative along-line distances.
//! For routing, every pair of stops on a serviceable line is a direct edge
//! (a line is a clique), weighted by the along-line distance between them.

pub mod error;
pub mod network;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{NetworkError, NetworkResult};
pub use network::{Line, LineStop, NetworkDescription, RailNetwork, RailNetworkBuilder, Station};
pub use router::{find_route, Leg, Route, Router, RouterParams, UniformCostRouter};
