//! Weighted spatial demand grid.
//!
//! A grid is a flat list of cells, each a centre point plus a non-negative
//! weight.  Sampling picks a cell with probability proportional to its
//! weight (binary search over a prefix-sum table), then jitters the point
//! uniformly inside the cell so that trips do not all start on the centre.

use serde::{Deserialize, Serialize};

use rail_core::{GeoPoint, PointFeature, SimRng};

/// Upper bound on the cells [`DemandGrid::generate`] produces.  Wider
/// extents get coarser cells.
pub const MAX_GENERATED_CELLS: usize = 100_000;

/// One grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandCell {
    pub pos: GeoPoint,
    /// Relative trip-generation weight.  Always finite and `>= 0`.
    pub weight: f64,
}

impl DemandCell {
    pub fn new(pos: GeoPoint, weight: f64) -> Self {
        Self { pos, weight }
    }
}

/// Generation knobs for [`DemandGrid::generate`].
#[derive(Copy, Clone, Debug)]
pub struct GridGenParams {
    /// Cell edge length, metres.
    pub cell_size_m: f64,
    /// Margin added around the station bounding box, metres.
    pub padding_m: f64,
    /// Distance over which a station's pull on demand decays by `1/e`.
    pub decay_m: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DemandGrid {
    cells: Vec<DemandCell>,
    /// Edge length used for sampling jitter.  `0` disables jitter.
    cell_size_m: f64,
    /// `cumulative[i]` = Σ weight of cells `0..=i`.
    cumulative: Vec<f64>,
}

impl DemandGrid {
    /// Build a grid from cells.  Cells with a non-finite or negative weight
    /// are dropped.
    pub fn new(cells: Vec<DemandCell>, cell_size_m: f64) -> Self {
        let cells: Vec<DemandCell> = cells
            .into_iter()
            .filter(|c| c.weight.is_finite() && c.weight >= 0.0)
            .filter(|c| c.pos.lng.is_finite() && c.pos.lat.is_finite())
            .collect();

        let mut cumulative = Vec::with_capacity(cells.len());
        let mut acc = 0.0;
        for c in &cells {
            acc += c.weight;
            cumulative.push(acc);
        }

        Self { cells, cell_size_m: cell_size_m.max(0.0), cumulative }
    }

    /// Synthesize a grid covering `anchors` (usually station positions).
    ///
    /// Each cell's weight is the sum of `exp(-d / decay_m)` over every
    /// anchor, scaled by a random factor in `[0.5, 1.5)` so that demand is
    /// lumpy rather than a smooth field.  Returns an empty grid when there
    /// are no anchors.
    ///
    /// The cell size grows past `params.cell_size_m` when the extent would
    /// need more than [`MAX_GENERATED_CELLS`] cells.
    pub fn generate(anchors: &[GeoPoint], params: &GridGenParams, rng: &mut SimRng) -> Self {
        if anchors.is_empty() || params.cell_size_m <= 0.0 {
            return Self::new(Vec::new(), params.cell_size_m);
        }

        let mut min = anchors[0];
        let mut max = anchors[0];
        for p in anchors {
            min.lng = min.lng.min(p.lng);
            min.lat = min.lat.min(p.lat);
            max.lng = max.lng.max(p.lng);
            max.lat = max.lat.max(p.lat);
        }
        let sw = min.offset_m(-params.padding_m, -params.padding_m);
        let ne = max.offset_m(params.padding_m, params.padding_m);

        let centre = sw.lerp(ne, 0.5);
        let mut cell_size_m = params.cell_size_m;
        let (cols, rows, step_lng, step_lat) = loop {
            let (step_lng, step_lat) = centre.degree_extent(cell_size_m);
            let cols = (((ne.lng - sw.lng) / step_lng).ceil() as usize).max(1);
            let rows = (((ne.lat - sw.lat) / step_lat).ceil() as usize).max(1);
            let count = cols.saturating_mul(rows);
            if count <= MAX_GENERATED_CELLS {
                break (cols, rows, step_lng, step_lat);
            }
            cell_size_m *= (count as f64 / MAX_GENERATED_CELLS as f64).sqrt().max(1.05);
        };
        let decay = params.decay_m.max(1.0);

        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let pos = GeoPoint::new(
                    sw.lng + (c as f64 + 0.5) * step_lng,
                    sw.lat + (r as f64 + 0.5) * step_lat,
                );
                let pull: f64 = anchors.iter().map(|a| (-pos.distance_m(*a) / decay).exp()).sum();
                let noise = rng.gen_range(0.5..1.5);
                cells.push(DemandCell::new(pos, pull * noise));
            }
        }

        Self::new(cells, cell_size_m)
    }

    /// Interpret point features as cells, reading the `demand` property.
    /// Features without a usable `demand` get weight `1`.
    pub fn from_features(features: &[PointFeature], cell_size_m: f64) -> Self {
        let cells = features
            .iter()
            .map(|f| DemandCell::new(f.pos(), f.demand().unwrap_or(1.0)))
            .collect();
        Self::new(cells, cell_size_m)
    }

    /// Cells as point features carrying a `demand` property.
    pub fn to_features(&self) -> Vec<PointFeature> {
        self.cells
            .iter()
            .map(|c| PointFeature::new([c.pos.lng, c.pos.lat]).with_property("demand", c.weight))
            .collect()
    }

    #[inline]
    pub fn cells(&self) -> &[DemandCell] {
        &self.cells
    }

    #[inline]
    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Draw one point.  `None` if the grid carries no weight.
    pub fn sample_point(&self, rng: &mut SimRng) -> Option<GeoPoint> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        let r = rng.gen_range(0.0..total);
        let idx = self.cumulative.partition_point(|&c| c <= r).min(self.cells.len() - 1);
        let centre = self.cells[idx].pos;

        let half = self.cell_size_m * 0.5;
        if half <= 0.0 {
            return Some(centre);
        }
        let east = rng.gen_range(-half..half);
        let north = rng.gen_range(-half..half);
        Some(centre.offset_m(east, north))
    }

    /// Summed weight of cells whose centre lies within `radius_m` of `pos`.
    pub fn weight_near(&self, pos: GeoPoint, radius_m: f64) -> f64 {
        let (d_lng, d_lat) = pos.degree_extent(radius_m);
        self.cells
            .iter()
            .filter(|c| (c.pos.lng - pos.lng).abs() <= d_lng && (c.pos.lat - pos.lat).abs() <= d_lat)
            .filter(|c| c.pos.distance_m(pos) <= radius_m)
            .map(|c| c.weight)
            .sum()
    }
}
