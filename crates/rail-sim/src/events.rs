//! Events sent from the engine to the host.

use serde::{Deserialize, Serialize};

use rail_core::{FeatureKey, GeoPoint, LineId, PointFeature, StationId};
use rail_demand::GridSource;
use rail_network::Route;

use crate::incidents::Incident;
use crate::snapshot::Snapshot;

/// Every message the engine emits.  On the wire: `{"type": "Tick", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The engine is constructed and accepting commands.
    Ready { seed: u64, tick_duration_secs: u32 },
    /// A network rebuild finished.
    NetworkReady(NetworkSummary),
    Tick(Snapshot),
    DemandGridData {
        cells: Vec<PointFeature>,
        source: Option<GridSource>,
    },
    JourneyPlanResult(JourneyPlan),
    DemandDetailsResult(DemandDetails),
    Incident {
        transition: IncidentTransition,
        incident: Incident,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentTransition {
    Created,
    Expired,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSummary {
    pub id: LineId,
    pub key: FeatureKey,
    pub name: String,
    pub length_m: f64,
    pub stops: usize,
    pub serviceable: bool,
    pub trains: usize,
    /// Construction price of the line at current rates.
    pub estimated_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub stations: usize,
    pub lines: usize,
    pub serviceable_lines: usize,
    pub trains: usize,
    pub queued_passengers_kept: usize,
    pub line_summaries: Vec<LineSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationRef {
    pub id: StationId,
    pub key: FeatureKey,
    pub name: String,
    pub pos: GeoPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JourneyPlan {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub origin_station: Option<StationRef>,
    pub destination_station: Option<StationRef>,
    /// `None` when no rail path links the two stations.
    pub route: Option<Route>,
    pub walk_to_station_m: f64,
    pub walk_to_station_secs: f64,
    pub walk_from_station_m: f64,
    pub walk_from_station_secs: f64,
    /// Walk + ride + wait + walk, when a route exists.
    pub total_time_secs: Option<f64>,
    /// Walking the whole way instead.
    pub direct_walk_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearbyStation {
    pub station: StationRef,
    pub distance_m: f64,
    pub walk_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandDetails {
    pub coordinates: GeoPoint,
    /// Nearest first.
    pub stations: Vec<NearbyStation>,
    /// Relative trip activity for each hour of the day.
    pub hourly_activity: Vec<f64>,
}
