//! Boundary geometry: point and line features with an opaque property bag.
//!
//! Hosts hand the engine GeoJSON-like features.  The engine reads only the
//! `id`, `name` and `demand` properties and carries everything else through
//! untouched.
//!
//! # Identity normalization
//!
//! Ids arrive as numbers or strings, sometimes both for the same object
//! (`5` from one producer, `"5"` from another).  [`FeatureKey`] is the
//! normalized form: integral numbers print without a fractional part and
//! strings are trimmed, so both spellings above map to the key `"5"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GeoPoint;

/// Opaque key/value property bag.
pub type Properties = serde_json::Map<String, Value>;

// ── FeatureId / FeatureKey ────────────────────────────────────────────────────

/// A raw id as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(f64),
    Text(String),
}

impl FeatureId {
    /// Normalize into a [`FeatureKey`].
    pub fn key(&self) -> FeatureKey {
        match self {
            FeatureId::Number(n) => FeatureKey(number_key(*n)),
            FeatureId::Text(s)   => FeatureKey(s.trim().to_owned()),
        }
    }

    fn from_value(v: &Value) -> Option<FeatureId> {
        match v {
            Value::Number(n) => n.as_f64().map(FeatureId::Number),
            Value::String(s) if !s.trim().is_empty() => Some(FeatureId::Text(s.clone())),
            _ => None,
        }
    }
}

fn number_key(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Normalized external identity of a station or line.
///
/// Stable across network rebuilds (unlike `StationId`/`LineId`), so it is
/// the key used in snapshots and for carrying queued passengers over a
/// rebuild.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureKey(pub String);

impl FeatureKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureKey {
    fn from(s: &str) -> Self {
        FeatureId::Text(s.to_owned()).key()
    }
}

impl From<i64> for FeatureKey {
    fn from(n: i64) -> Self {
        FeatureKey(n.to_string())
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the key for a feature: explicit `id`, then `properties.id`, then
/// a positional fallback `"{prefix}-{index}"`.
fn resolve_key(id: Option<&FeatureId>, properties: &Properties, prefix: &str, index: usize) -> FeatureKey {
    id.cloned()
        .or_else(|| properties.get("id").and_then(FeatureId::from_value))
        .map(|id| id.key())
        .unwrap_or_else(|| FeatureKey(format!("{prefix}-{index}")))
}

fn resolve_name(properties: &Properties, key: &FeatureKey) -> String {
    match properties.get("name") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => key.0.clone(),
    }
}

// ── PointFeature ──────────────────────────────────────────────────────────────

/// A point with an optional id and a property bag.  Used for stations and
/// demand-grid cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    /// `[lng, lat]`.
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub properties: Properties,
}

impl PointFeature {
    pub fn new(coordinates: [f64; 2]) -> Self {
        Self { id: None, coordinates, properties: Properties::new() }
    }

    /// Builder-style id setter.
    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    #[inline]
    pub fn pos(&self) -> GeoPoint {
        GeoPoint::from(self.coordinates)
    }

    pub fn key(&self, index: usize) -> FeatureKey {
        resolve_key(self.id.as_ref(), &self.properties, "station", index)
    }

    pub fn name(&self, key: &FeatureKey) -> String {
        resolve_name(&self.properties, key)
    }

    /// The numeric `demand` property, if present and non-negative.
    pub fn demand(&self) -> Option<f64> {
        self.properties
            .get("demand")
            .and_then(Value::as_f64)
            .filter(|d| d.is_finite() && *d >= 0.0)
    }
}

// ── LineFeature ───────────────────────────────────────────────────────────────

/// An ordered polyline with an optional id and a property bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    /// `[[lng, lat], …]` in travel order.
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub properties: Properties,
}

impl LineFeature {
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self { id: None, coordinates, properties: Properties::new() }
    }

    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.coordinates.iter().copied().map(GeoPoint::from)
    }

    pub fn key(&self, index: usize) -> FeatureKey {
        resolve_key(self.id.as_ref(), &self.properties, "line", index)
    }

    pub fn name(&self, key: &FeatureKey) -> String {
        resolve_name(&self.properties, key)
    }
}
