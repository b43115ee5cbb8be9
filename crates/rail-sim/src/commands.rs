//! Commands sent from the host to the engine.

use serde::{Deserialize, Serialize};

use rail_core::{LineFeature, PointFeature};

/// Every message the engine accepts.  On the wire:
/// `{"type": "BuildInfrastructure", "cost": 1000000}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Resume timer-driven ticking.
    Start,
    /// Stop timer-driven ticking.  State is untouched.
    Pause,
    /// Replace the network wholesale.
    UpdateNetwork {
        #[serde(default)]
        lines: Vec<LineFeature>,
        #[serde(default)]
        stations: Vec<PointFeature>,
    },
    /// Pay for construction now.
    BuildInfrastructure { cost: f64 },
    /// Plan a trip between two map points.
    PlanJourney { origin: [f64; 2], destination: [f64; 2] },
    /// Return the demand grid, generating one if needed.
    GetDemandGrid,
    /// Install a grid of `demand`-weighted points, or clear it with `null`.
    SetDemandGrid {
        #[serde(default)]
        grid: Option<Vec<PointFeature>>,
    },
    /// Nearby stations and hourly activity around a map point.
    GetDemandDetails { coordinates: [f64; 2] },
}
