//! CSV demand-grid loader.
//!
//! # CSV format
//!
//! One row per cell, with a header.  Extra columns are ignored.
//!
//! ```csv
//! lng,lat,demand
//! -0.1276,51.5072,12.5
//! -0.1200,51.5072,3.0
//! ```
//!
//! `demand` must be finite and non-negative; a bad row fails the whole load
//! with [`DemandError::Parse`] naming the 1-based data row.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use rail_core::GeoPoint;

use crate::grid::{DemandCell, DemandGrid};
use crate::DemandError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CellRecord {
    lng:    f64,
    lat:    f64,
    demand: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a demand grid from a CSV file.
pub fn load_grid_csv(path: &Path, cell_size_m: f64) -> Result<DemandGrid, DemandError> {
    let file = std::fs::File::open(path).map_err(DemandError::Io)?;
    load_grid_reader(file, cell_size_m)
}

/// Like [`load_grid_csv`] but accepts any `Read` source.
pub fn load_grid_reader<R: Read>(reader: R, cell_size_m: f64) -> Result<DemandGrid, DemandError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut cells = Vec::new();

    for (row, result) in csv_reader.deserialize::<CellRecord>().enumerate() {
        let rec = result.map_err(|e| DemandError::Parse(e.to_string()))?;
        if !rec.lng.is_finite() || !rec.lat.is_finite() {
            return Err(DemandError::Parse(format!("row {}: non-finite coordinate", row + 1)));
        }
        if !rec.demand.is_finite() || rec.demand < 0.0 {
            return Err(DemandError::Parse(format!(
                "row {}: demand must be a non-negative number, got {}",
                row + 1,
                rec.demand
            )));
        }
        cells.push(DemandCell::new(GeoPoint::new(rec.lng, rec.lat), rec.demand));
    }

    Ok(DemandGrid::new(cells, cell_size_m))
}
