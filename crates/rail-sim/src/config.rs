//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "sim": { "seed": 7, "tick_duration_secs": 5 },
//!   "economics": { "fare_per_km": 0.4 },
//!   "max_queue_residency_secs": null }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rail_core::SimConfig;
use rail_demand::DemandParams;
use rail_network::RouterParams;
use rail_service::{ExchangeParams, KinematicsParams, TrainParams};

use crate::{SimError, SimResult};

/// Station snapping for network rebuilds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// A line vertex closer than this to a station serves it.  Default 50 m.
    pub snap_threshold_m: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self { snap_threshold_m: 50.0 }
    }
}

/// Walking legs to and from stations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    /// Default 1.3 m/s.
    pub walk_speed_mps: f64,
    /// Fixed time to enter or leave a station, added to every walk leg.
    /// Default 60 s.
    pub station_access_secs: f64,
    /// Trips whose origin or destination is farther than this from any
    /// station are not made.  Default 2 km.
    pub max_access_m: f64,
    /// Search radius for demand details.  Default 2 km.
    pub details_radius_m: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.3,
            station_access_secs: 60.0,
            max_access_m: 2_000.0,
            details_radius_m: 2_000.0,
        }
    }
}

impl WalkParams {
    /// Walk time for `distance_m`, including station access.
    pub fn walk_secs(&self, distance_m: f64) -> f64 {
        distance_m.max(0.0) / self.walk_speed_mps.max(f64::EPSILON) + self.station_access_secs.max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsParams {
    pub initial_budget: f64,
    /// Lowest value the budget can reach.  Large and negative.
    pub budget_floor: f64,
    pub fare_per_km: f64,
    pub opex_per_train_km: f64,
    pub opex_per_station_hour: f64,
    pub cost_per_track_km: f64,
    pub cost_per_station: f64,
}

impl Default for EconomicsParams {
    fn default() -> Self {
        Self {
            initial_budget: 50_000_000.0,
            budget_floor: -1_000_000_000.0,
            fare_per_km: 0.25,
            opex_per_train_km: 12.0,
            opex_per_station_hour: 25.0,
            cost_per_track_km: 2_000_000.0,
            cost_per_station: 750_000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentParams {
    pub enabled: bool,
    /// Expected incidents per 10,000 train-km.  Default 5.
    pub rate_per_10k_km: f64,
    /// Capped speed as a fraction of the nominal maximum.  Default 0.4.
    pub speed_cap_fraction: f64,
    /// Default 15 min.
    pub speed_cap_duration_secs: f64,
    /// Default 120 s.
    pub extra_dwell_secs: f64,
    /// Default 10 min.
    pub extra_dwell_duration_secs: f64,
}

impl Default for IncidentParams {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_per_10k_km: 5.0,
            speed_cap_fraction: 0.4,
            speed_cap_duration_secs: 900.0,
            extra_dwell_secs: 120.0,
            extra_dwell_duration_secs: 600.0,
        }
    }
}

impl IncidentParams {
    /// Train-km between incident rolls, or `None` when incidents are off.
    pub fn check_interval_km(&self) -> Option<f64> {
        if !self.enabled || !(self.rate_per_10k_km > 0.0) {
            return None;
        }
        Some(10_000.0 / self.rate_per_10k_km)
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sim: SimConfig,
    pub network: NetworkParams,
    pub router: RouterParams,
    pub kinematics: KinematicsParams,
    pub trains: TrainParams,
    pub exchange: ExchangeParams,
    pub walking: WalkParams,
    pub demand: DemandParams,
    pub economics: EconomicsParams,
    pub incidents: IncidentParams,
    /// Longest a passenger waits in one queue before giving up.  Default 3 h;
    /// `null` disables the limit.
    pub max_queue_residency_secs: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            network: NetworkParams::default(),
            router: RouterParams::default(),
            kinematics: KinematicsParams::default(),
            trains: TrainParams::default(),
            exchange: ExchangeParams::default(),
            walking: WalkParams::default(),
            demand: DemandParams::default(),
            economics: EconomicsParams::default(),
            incidents: IncidentParams::default(),
            max_queue_residency_secs: Some(3.0 * 3_600.0),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if self.sim.tick_duration_secs == 0 {
            return Err(SimError::Config("tick_duration_secs must be > 0".into()));
        }
        if !(self.kinematics.acceleration_mps2 > 0.0) {
            return Err(SimError::Config("acceleration_mps2 must be > 0".into()));
        }
        if !(self.kinematics.max_speed_mps > 0.0) {
            return Err(SimError::Config("max_speed_mps must be > 0".into()));
        }
        if !(self.network.snap_threshold_m > 0.0) {
            return Err(SimError::Config("snap_threshold_m must be > 0".into()));
        }
        if !(self.walking.walk_speed_mps > 0.0) {
            return Err(SimError::Config("walk_speed_mps must be > 0".into()));
        }
        if !(self.router.nominal_speed_mps > 0.0) {
            return Err(SimError::Config("nominal_speed_mps must be > 0".into()));
        }
        if self.economics.budget_floor > self.economics.initial_budget {
            return Err(SimError::Config("budget_floor must not exceed initial_budget".into()));
        }
        Ok(())
    }
}
