//! Two-line network over Mobile, Alabama.
//!
//! ```text
//!   Springhill ── Midtown ── Downtown ── Port        (blue, east-west)
//!                              │
//!                          Crichton                   (gold, north-south)
//!                              │
//!                          Airport Blvd
//! ```
//!
//! Downtown is the shared transfer station.

use rail_core::{FeatureId, LineFeature, PointFeature};
use rail_network::NetworkDescription;

fn station(id: i64, name: &str, lng: f64, lat: f64) -> PointFeature {
    PointFeature::new([lng, lat])
        .with_id(FeatureId::Number(id as f64))
        .with_property("name", name)
}

fn line(id: &str, name: &str, coords: &[[f64; 2]]) -> LineFeature {
    LineFeature::new(coords.to_vec())
        .with_id(FeatureId::Text(id.into()))
        .with_property("name", name)
}

pub const SPRINGHILL: [f64; 2] = [-88.130, 30.695];
pub const MIDTOWN:    [f64; 2] = [-88.090, 30.690];
pub const DOWNTOWN:   [f64; 2] = [-88.050, 30.690];
pub const PORT:       [f64; 2] = [-88.035, 30.692];
pub const CRICHTON:   [f64; 2] = [-88.050, 30.670];
pub const AIRPORT:    [f64; 2] = [-88.050, 30.650];

pub fn build_network() -> NetworkDescription {
    NetworkDescription {
        stations: vec![
            station(1, "Springhill",   SPRINGHILL[0], SPRINGHILL[1]),
            station(2, "Midtown",      MIDTOWN[0],    MIDTOWN[1]),
            station(3, "Downtown",     DOWNTOWN[0],   DOWNTOWN[1]),
            station(4, "Port",         PORT[0],       PORT[1]),
            station(5, "Crichton",     CRICHTON[0],   CRICHTON[1]),
            station(6, "Airport Blvd", AIRPORT[0],    AIRPORT[1]),
        ],
        lines: vec![
            line("blue", "Blue Line", &[SPRINGHILL, [-88.110, 30.693], MIDTOWN, DOWNTOWN, PORT]),
            line("gold", "Gold Line", &[DOWNTOWN, CRICHTON, AIRPORT]),
        ],
    }
}
