//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` stores longitude/latitude as `f64`.  Cumulative line distances
//! feed the train kinematics directly, and single precision drifts by
//! metres over a 30 km line.

use serde::{Deserialize, Serialize};

/// Mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude (and of longitude at the equator).
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// A WGS-84 geographic coordinate, `[lng, lat]` order on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Linear interpolation in lng/lat space.  Good enough between two
    /// adjacent polyline vertices.
    #[inline]
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Point displaced by `east_m` / `north_m` metres (flat-earth approximation).
    pub fn offset_m(self, east_m: f64, north_m: f64) -> GeoPoint {
        let cos_lat = self.lat.to_radians().cos().max(1e-6);
        GeoPoint {
            lng: self.lng + east_m / (METRES_PER_DEGREE * cos_lat),
            lat: self.lat + north_m / METRES_PER_DEGREE,
        }
    }

    /// Half-extents in degrees `(d_lng, d_lat)` of a box of radius `metres`
    /// around this point.  Used to turn metric radii into R-tree envelopes.
    pub fn degree_extent(self, metres: f64) -> (f64, f64) {
        let cos_lat = self.lat.to_radians().cos().max(1e-6);
        (metres / (METRES_PER_DEGREE * cos_lat), metres / METRES_PER_DEGREE)
    }
}

impl From<[f64; 2]> for GeoPoint {
    /// GeoJSON coordinate order: `[lng, lat]`.
    fn from(c: [f64; 2]) -> Self {
        GeoPoint::new(c[0], c[1])
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}
