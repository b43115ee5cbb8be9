//! Trip generation: how many trips this tick, and from where to where.

use serde::{Deserialize, Serialize};

use rail_core::{GeoPoint, SimRng, time::SECS_PER_HOUR};

use crate::grid::{DemandGrid, GridGenParams};
use crate::profile::HourlyProfile;

/// Demand tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandParams {
    /// Trips per simulated hour at profile multiplier `1.0`.  Default 600.
    pub base_trips_per_hour: f64,
    /// Edge length of generated cells, metres.  Default 500.
    pub cell_size_m: f64,
    /// Margin around the station bounding box when generating.  Default 2 km.
    pub padding_m: f64,
    /// Station pull decay distance when generating.  Default 1.5 km.
    pub decay_m: f64,
    pub profile: HourlyProfile,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            base_trips_per_hour: 600.0,
            cell_size_m: 500.0,
            padding_m: 2_000.0,
            decay_m: 1_500.0,
            profile: HourlyProfile::default(),
        }
    }
}

impl DemandParams {
    pub fn gen_params(&self) -> GridGenParams {
        GridGenParams { cell_size_m: self.cell_size_m, padding_m: self.padding_m, decay_m: self.decay_m }
    }
}

/// Where the current grid came from.
///
/// A generated grid follows the network and is discarded when the network
/// is rebuilt; an installed grid is kept until explicitly cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridSource {
    Generated,
    Installed,
}

pub struct DemandModel {
    pub params: DemandParams,
    grid: Option<(DemandGrid, GridSource)>,
    /// Fractional trips not yet emitted.  Always in `[0, 1)`.
    carry: f64,
}

impl DemandModel {
    pub fn new(params: DemandParams) -> Self {
        Self { params, grid: None, carry: 0.0 }
    }

    #[inline]
    pub fn grid(&self) -> Option<&DemandGrid> {
        self.grid.as_ref().map(|(g, _)| g)
    }

    pub fn grid_source(&self) -> Option<GridSource> {
        self.grid.as_ref().map(|(_, s)| *s)
    }

    /// Install a host-provided grid, or clear the grid with `None`.
    pub fn set_grid(&mut self, grid: Option<DemandGrid>) {
        self.grid = grid.map(|g| (g, GridSource::Installed));
    }

    /// Drop a generated grid so it is regenerated for the new network.
    /// Installed grids survive.
    pub fn on_network_changed(&mut self) {
        if self.grid_source() == Some(GridSource::Generated) {
            self.grid = None;
        }
    }

    /// Return the current grid, generating one around `anchors` if none is
    /// set.  `None` only when there is no grid and no anchors.
    pub fn ensure_grid(&mut self, anchors: &[GeoPoint], rng: &mut SimRng) -> Option<&DemandGrid> {
        if self.grid.is_none() && !anchors.is_empty() {
            let grid = DemandGrid::generate(anchors, &self.params.gen_params(), rng);
            self.grid = Some((grid, GridSource::Generated));
        }
        self.grid()
    }

    /// Number of trips to start during a tick of `tick_secs` at
    /// `hour_of_day`.  Fractions accumulate across ticks.
    pub fn trips_this_tick(&mut self, hour_of_day: f64, tick_secs: f64) -> u32 {
        let rate = self.params.base_trips_per_hour.max(0.0) * self.params.profile.multiplier(hour_of_day);
        let expected = rate * tick_secs.max(0.0) / SECS_PER_HOUR as f64 + self.carry;
        if !expected.is_finite() {
            self.carry = 0.0;
            return 0;
        }
        let trips = expected.floor();
        self.carry = expected - trips;
        trips.min(u32::MAX as f64) as u32
    }

    /// Sample an origin/destination pair from the grid.
    pub fn sample_od(&self, rng: &mut SimRng) -> Option<(GeoPoint, GeoPoint)> {
        let grid = self.grid()?;
        let origin = grid.sample_point(rng)?;
        let destination = grid.sample_point(rng)?;
        Some((origin, destination))
    }

    /// 24-hour activity at `pos`: local grid weight within `radius_m` times
    /// the hourly curve.  Without a grid the bare curve is returned.
    pub fn activity_profile(&self, pos: GeoPoint, radius_m: f64) -> [f64; 24] {
        let weight = match self.grid() {
            Some(g) if !g.is_empty() => g.weight_near(pos, radius_m),
            _ => 1.0,
        };
        self.params.profile.scaled(weight)
    }
}
