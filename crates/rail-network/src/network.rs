//! Rail network representation and builder.
//!
//! # Data layout
//!
//! Stations and lines live in two flat `Vec`s indexed by `StationId` and
//! `LineId`.  Both tables are rebuilt from scratch on every network update;
//! nothing is patched incrementally.
//!
//! Each [`Line`] keeps its polyline, a cumulative-distance profile with one
//! entry per vertex, and its stops sorted by cumulative distance.  Stations
//! snapped to the same vertex share a distance and keep vertex-scan order.  All
//! along-line positions in the simulator (train positions, leg endpoints) are
//! distances on that axis.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `[lng, lat]` to `StationId`.  It answers the
//! vertex-proximity test during snapping and the nearest-station /
//! stations-within-radius queries used by journey planning.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use rail_core::{Direction, FeatureKey, GeoPoint, LineFeature, LineId, PointFeature, Properties, StationId};

use crate::NetworkResult;

/// Distances closer than this are the same point on the line axis.
const AXIS_EPSILON_M: f64 = 1e-6;

/// Candidates fetched from the R-tree before the exact haversine pick.
const NEAREST_CANDIDATES: usize = 8;

// ── R-tree station entry ──────────────────────────────────────────────────────

#[derive(Clone)]
struct StationEntry {
    point: [f64; 2], // [lng, lat]
    id: StationId,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationEntry {
    /// Squared Euclidean distance in degree space.  Only used to rank
    /// candidates; exact distances are haversine.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlng = self.point[0] - point[0];
        let dlat = self.point[1] - point[1];
        dlng * dlng + dlat * dlat
    }
}

// ── Station / Line ────────────────────────────────────────────────────────────

/// A station point.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub key: FeatureKey,
    pub name: String,
    pub pos: GeoPoint,
    /// Lines with a stop at this station, ascending.
    pub lines: Vec<LineId>,
    pub properties: Properties,
}

/// One stop on a line: the station and its cumulative distance from the
/// line's first vertex.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineStop {
    pub station: StationId,
    pub distance_m: f64,
}

/// A polyline with the stations snapped onto it.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub key: FeatureKey,
    pub name: String,
    pub coords: Vec<GeoPoint>,
    /// Cumulative distance at each vertex; `cumulative_m[0] == 0`.
    pub cumulative_m: Vec<f64>,
    pub length_m: f64,
    /// Stops sorted ascending by `distance_m`.
    pub stops: Vec<LineStop>,
    pub properties: Properties,
}

impl Line {
    /// Lines with fewer than two stops are kept for display but never run
    /// trains or carry routes.
    #[inline]
    pub fn is_serviceable(&self) -> bool {
        self.stops.len() >= 2
    }

    /// Position of `station` in `stops`, if the line serves it.
    pub fn stop_index(&self, station: StationId) -> Option<usize> {
        self.stops.iter().position(|s| s.station == station)
    }

    pub fn stop_distance(&self, station: StationId) -> Option<f64> {
        self.stop_index(station).map(|i| self.stops[i].distance_m)
    }

    /// Index of the next stop a train at `distance_m` moving in `direction`
    /// should serve.
    ///
    /// Stops at the train's own distance count as ahead when they come after
    /// `served` in travel order, so stations snapped to one vertex are each
    /// served in both directions.  With `served == None` every stop at the
    /// current distance is still due.
    pub fn next_stop(&self, distance_m: f64, direction: Direction, served: Option<usize>) -> Option<usize> {
        let due_here = |i: usize| {
            (self.stops[i].distance_m - distance_m).abs() <= AXIS_EPSILON_M
                && match (direction, served) {
                    (_, None) => true,
                    (Direction::Forward, Some(s)) => i > s,
                    (Direction::Backward, Some(s)) => i < s,
                }
        };
        match direction {
            Direction::Forward => (0..self.stops.len())
                .find(|&i| due_here(i) || self.stops[i].distance_m > distance_m + AXIS_EPSILON_M),
            Direction::Backward => (0..self.stops.len())
                .rev()
                .find(|&i| due_here(i) || self.stops[i].distance_m < distance_m - AXIS_EPSILON_M),
        }
    }

    /// `true` if `distance_m` sits on either end of the line.
    #[inline]
    pub fn is_at_end(&self, distance_m: f64) -> bool {
        distance_m <= AXIS_EPSILON_M || distance_m >= self.length_m - AXIS_EPSILON_M
    }

    /// Coordinate at `distance_m` along the line (clamped to the line).
    ///
    /// Returns `None` only for a line with no vertices.
    pub fn position_at(&self, distance_m: f64) -> Option<GeoPoint> {
        let first = *self.coords.first()?;
        let d = distance_m.clamp(0.0, self.length_m);
        let i = self.cumulative_m.partition_point(|&c| c <= d);
        if i == 0 {
            return Some(first);
        }
        if i >= self.coords.len() {
            return self.coords.last().copied();
        }
        let seg = self.cumulative_m[i] - self.cumulative_m[i - 1];
        let t = if seg > 0.0 { (d - self.cumulative_m[i - 1]) / seg } else { 0.0 };
        Some(self.coords[i - 1].lerp(self.coords[i], t))
    }

    /// Polyline between two along-line distances, in travel order from
    /// `from_m` to `to_m`.
    pub fn slice_between(&self, from_m: f64, to_m: f64) -> Vec<GeoPoint> {
        let (lo, hi) = if from_m <= to_m { (from_m, to_m) } else { (to_m, from_m) };
        let mut pts = Vec::new();
        pts.extend(self.position_at(lo));
        pts.extend(
            self.coords
                .iter()
                .zip(&self.cumulative_m)
                .filter(|&(_, &c)| c > lo && c < hi)
                .map(|(&p, _)| p),
        );
        if hi > lo {
            pts.extend(self.position_at(hi));
        }
        if from_m > to_m {
            pts.reverse();
        }
        pts
    }
}

// ── NetworkDescription ────────────────────────────────────────────────────────

/// The raw network as a host describes it: line and station features.
///
/// This is the payload of the `UpdateNetwork` command and the on-disk format
/// read by [`from_json_path`](Self::from_json_path).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    #[serde(default)]
    pub lines: Vec<LineFeature>,
    #[serde(default)]
    pub stations: Vec<PointFeature>,
}

impl NetworkDescription {
    pub fn from_json_reader<R: Read>(reader: R) -> NetworkResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_path(path: &Path) -> NetworkResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }
}

// ── RailNetwork ───────────────────────────────────────────────────────────────

/// Stations, lines, and a spatial index over stations.
///
/// Do not construct directly; use [`RailNetworkBuilder`] or
/// [`RailNetwork::from_description`].
pub struct RailNetwork {
    pub stations: Vec<Station>,
    pub lines: Vec<Line>,
    station_keys: BTreeMap<FeatureKey, StationId>,
    line_keys: BTreeMap<FeatureKey, LineId>,
    spatial_idx: RTree<StationEntry>,
}

impl RailNetwork {
    /// A network with no stations or lines.
    pub fn empty() -> Self {
        RailNetworkBuilder::new(0.0).build()
    }

    /// Build from a host description.
    pub fn from_description(desc: &NetworkDescription, snap_threshold_m: f64) -> Self {
        let mut b = RailNetworkBuilder::new(snap_threshold_m);
        for s in &desc.stations {
            b.add_station(s.clone());
        }
        for l in &desc.lines {
            b.add_line(l.clone());
        }
        b.build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.lines.is_empty()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    #[inline]
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id.index())
    }

    pub fn station_by_key(&self, key: &FeatureKey) -> Option<StationId> {
        self.station_keys.get(key).copied()
    }

    pub fn line_by_key(&self, key: &FeatureKey) -> Option<LineId> {
        self.line_keys.get(key).copied()
    }

    /// Lines that run trains and carry routes.
    pub fn serviceable_lines(&self) -> impl Iterator<Item = &Line> + '_ {
        self.lines.iter().filter(|l| l.is_serviceable())
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The nearest station to `pos` and its haversine distance in metres.
    ///
    /// Returns `None` only if the network has no stations.
    pub fn nearest_station(&self, pos: GeoPoint) -> Option<(StationId, f64)> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lng, pos.lat])
            .take(NEAREST_CANDIDATES)
            .map(|e| (e.id, pos.distance_m(self.stations[e.id.index()].pos)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    /// All stations within `radius_m` of `pos`, nearest first (ties by id).
    pub fn stations_within(&self, pos: GeoPoint, radius_m: f64) -> Vec<(StationId, f64)> {
        let mut found: Vec<(StationId, f64)> = self
            .spatial_idx
            .locate_in_envelope(&envelope_around(pos, radius_m))
            .map(|e| (e.id, pos.distance_m(self.stations[e.id.index()].pos)))
            .filter(|&(_, d)| d <= radius_m)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// `(south-west, north-east)` corners of the station extent.
    pub fn station_bounds(&self) -> Option<(GeoPoint, GeoPoint)> {
        let first = self.stations.first()?.pos;
        let (mut sw, mut ne) = (first, first);
        for s in &self.stations[1..] {
            sw.lng = sw.lng.min(s.pos.lng);
            sw.lat = sw.lat.min(s.pos.lat);
            ne.lng = ne.lng.max(s.pos.lng);
            ne.lat = ne.lat.max(s.pos.lat);
        }
        Some((sw, ne))
    }
}

fn envelope_around(pos: GeoPoint, radius_m: f64) -> AABB<[f64; 2]> {
    let (dlng, dlat) = pos.degree_extent(radius_m);
    AABB::from_corners([pos.lng - dlng, pos.lat - dlat], [pos.lng + dlng, pos.lat + dlat])
}

// ── RailNetworkBuilder ────────────────────────────────────────────────────────

/// Collect station and line features, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use rail_core::{LineFeature, PointFeature};
/// use rail_network::RailNetworkBuilder;
///
/// let mut b = RailNetworkBuilder::new(50.0);
/// b.add_station(PointFeature::new([0.0, 0.0]));
/// b.add_station(PointFeature::new([0.01, 0.0]));
/// b.add_line(LineFeature::new(vec![[0.0, 0.0], [0.01, 0.0]]));
/// let net = b.build();
/// assert_eq!(net.lines[0].stops.len(), 2);
/// assert!(net.lines[0].is_serviceable());
/// ```
pub struct RailNetworkBuilder {
    snap_threshold_m: f64,
    stations: Vec<PointFeature>,
    lines: Vec<LineFeature>,
}

impl RailNetworkBuilder {
    pub fn new(snap_threshold_m: f64) -> Self {
        Self { snap_threshold_m, stations: Vec::new(), lines: Vec::new() }
    }

    pub fn add_station(&mut self, feature: PointFeature) {
        self.stations.push(feature);
    }

    pub fn add_line(&mut self, feature: LineFeature) {
        self.lines.push(feature);
    }

    /// Consume the builder and produce a [`RailNetwork`].
    ///
    /// Stations whose key repeats an earlier station are dropped.  Line
    /// vertices with non-finite coordinates are skipped.
    pub fn build(self) -> RailNetwork {
        // ── Stations ──────────────────────────────────────────────────────
        let mut stations: Vec<Station> = Vec::with_capacity(self.stations.len());
        let mut station_keys = BTreeMap::new();
        for (i, f) in self.stations.into_iter().enumerate() {
            let pos = f.pos();
            if !pos.lng.is_finite() || !pos.lat.is_finite() {
                continue;
            }
            let key = f.key(i);
            if station_keys.contains_key(&key) {
                continue;
            }
            let id = StationId(stations.len() as u32);
            station_keys.insert(key.clone(), id);
            stations.push(Station {
                id,
                name: f.name(&key),
                key,
                pos,
                lines: Vec::new(),
                properties: f.properties,
            });
        }

        let spatial_idx = RTree::bulk_load(
            stations
                .iter()
                .map(|s| StationEntry { point: [s.pos.lng, s.pos.lat], id: s.id })
                .collect(),
        );

        // ── Lines ─────────────────────────────────────────────────────────
        let mut lines: Vec<Line> = Vec::with_capacity(self.lines.len());
        let mut line_keys = BTreeMap::new();
        for (i, f) in self.lines.into_iter().enumerate() {
            let id = LineId(lines.len() as u32);
            let key = f.key(i);
            line_keys.entry(key.clone()).or_insert(id);

            let coords: Vec<GeoPoint> = f
                .points()
                .filter(|p| p.lng.is_finite() && p.lat.is_finite())
                .collect();
            let cumulative_m = cumulative_profile(&coords);
            let length_m = cumulative_m.last().copied().unwrap_or(0.0);
            let stops = snap_stops(&coords, &cumulative_m, &stations, &spatial_idx, self.snap_threshold_m);

            for stop in &stops {
                stations[stop.station.index()].lines.push(id);
            }

            lines.push(Line {
                id,
                name: f.name(&key),
                key,
                coords,
                cumulative_m,
                length_m,
                stops,
                properties: f.properties,
            });
        }

        RailNetwork { stations, lines, station_keys, line_keys, spatial_idx }
    }
}

/// Running haversine sum, one entry per vertex.
fn cumulative_profile(coords: &[GeoPoint]) -> Vec<f64> {
    let mut out = Vec::with_capacity(coords.len());
    let mut total = 0.0;
    for (i, &p) in coords.iter().enumerate() {
        if i > 0 {
            total += coords[i - 1].distance_m(p);
        }
        out.push(total);
    }
    out
}

/// Match stations to line vertices.
///
/// A station matched by several vertices keeps its closest one (the
/// earliest on ties).  The result is sorted by cumulative distance with a
/// stable sort, so equal distances keep vertex order.
fn snap_stops(
    coords:      &[GeoPoint],
    cumulative:  &[f64],
    stations:    &[Station],
    spatial_idx: &RTree<StationEntry>,
    threshold_m: f64,
) -> Vec<LineStop> {
    // station → (snap distance, vertex index)
    let mut best: BTreeMap<StationId, (f64, usize)> = BTreeMap::new();

    for (vi, &p) in coords.iter().enumerate() {
        for entry in spatial_idx.locate_in_envelope(&envelope_around(p, threshold_m)) {
            let d = p.distance_m(stations[entry.id.index()].pos);
            if d >= threshold_m {
                continue;
            }
            match best.get(&entry.id) {
                Some(&(prev, _)) if prev <= d => {}
                _ => {
                    best.insert(entry.id, (d, vi));
                }
            }
        }
    }

    let mut matched: Vec<(usize, StationId)> = best.into_iter().map(|(s, (_, vi))| (vi, s)).collect();
    matched.sort_by_key(|&(vi, s)| (vi, s));

    let mut stops: Vec<LineStop> = matched
        .into_iter()
        .map(|(vi, station)| LineStop { station, distance_m: cumulative[vi] })
        .collect();
    stops.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    stops
}
