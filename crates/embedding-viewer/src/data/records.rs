//! Decoding of heterogeneous point entries into [`PointRecord`]s.
//!
//! Accepted entry shapes (checked in this order):
//! - `{ "coordinates": [x, y, z], ... }`
//! - `{ "point": [x, y, z], ... }`
//! - `[x, y, z]`
//!
//! Objects may carry `id` (string or integer) and `cluster` (integer, `null`
//! or missing meaning `0`). The dataset itself is either an array (ids default
//! to the entry index) or an object (ids default to the key).

use crate::error::PointCloudError;
use serde_json::{Map, Value};
use std::fmt;

/// Which field the coordinate triple was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    Coordinates,
    Point,
    Bare,
    Missing,
}

impl GeometrySource {
    /// Name of the field the coordinates came from, for diagnostics.
    pub fn field(self) -> Option<&'static str> {
        match self {
            GeometrySource::Coordinates => Some("coordinates"),
            GeometrySource::Point => Some("point"),
            GeometrySource::Bare => Some("bare array"),
            GeometrySource::Missing => None,
        }
    }
}

/// Why a coordinate could not be used.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryFault {
    Missing,
    NotAnArray,
    WrongArity(usize),
    NotANumber { axis: usize },
    NotFinite { axis: usize },
}

impl fmt::Display for GeometryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryFault::Missing => f.write_str("no coordinate field"),
            GeometryFault::NotAnArray => f.write_str("coordinate is not an array"),
            GeometryFault::WrongArity(n) => write!(f, "expected 3 components, found {n}"),
            GeometryFault::NotANumber { axis } => write!(f, "component {axis} is not a number"),
            GeometryFault::NotFinite { axis } => write!(f, "component {axis} is not finite"),
        }
    }
}

/// One input point after shape resolution. Geometry is still unvalidated
/// against the dataset as a whole; see [`crate::data::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: String,
    pub source: GeometrySource,
    pub geometry: Result<[f32; 3], GeometryFault>,
    /// Negative values mark noise / unclustered points.
    pub cluster: i32,
}

impl PointRecord {
    pub fn new(id: impl Into<String>, point: [f32; 3], cluster: i32) -> Self {
        Self {
            id: id.into(),
            source: GeometrySource::Point,
            geometry: Ok(point),
            cluster,
        }
    }
}

/// Decodes a whole dataset value.
pub fn parse_dataset(value: &Value) -> Result<Vec<PointRecord>, PointCloudError> {
    match value {
        Value::Array(entries) => Ok(entries
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_entry(&i.to_string(), entry))
            .collect()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(key, entry)| parse_entry(key, entry))
            .collect()),
        Value::Null => Err(PointCloudError::UnsupportedDataset("null")),
        Value::Bool(_) => Err(PointCloudError::UnsupportedDataset("a boolean")),
        Value::Number(_) => Err(PointCloudError::UnsupportedDataset("a number")),
        Value::String(_) => Err(PointCloudError::UnsupportedDataset("a string")),
    }
}

/// Decodes one entry; `fallback_id` is the array index or object key.
pub fn parse_entry(fallback_id: &str, entry: &Value) -> PointRecord {
    match entry {
        Value::Object(obj) => parse_object(fallback_id, obj),
        Value::Array(_) => PointRecord {
            id: fallback_id.to_owned(),
            source: GeometrySource::Bare,
            geometry: parse_triple(entry),
            cluster: 0,
        },
        _ => PointRecord {
            id: fallback_id.to_owned(),
            source: GeometrySource::Missing,
            geometry: Err(GeometryFault::Missing),
            cluster: 0,
        },
    }
}

fn parse_object(fallback_id: &str, obj: &Map<String, Value>) -> PointRecord {
    let id = match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => fallback_id.to_owned(),
    };

    let present = |key: &str| obj.get(key).filter(|v| !v.is_null());
    let (source, geometry) = if let Some(v) = present("coordinates") {
        (GeometrySource::Coordinates, parse_triple(v))
    } else if let Some(v) = present("point") {
        (GeometrySource::Point, parse_triple(v))
    } else {
        (GeometrySource::Missing, Err(GeometryFault::Missing))
    };

    PointRecord {
        id,
        source,
        geometry,
        cluster: parse_cluster(obj.get("cluster")),
    }
}

fn parse_triple(value: &Value) -> Result<[f32; 3], GeometryFault> {
    let items = value.as_array().ok_or(GeometryFault::NotAnArray)?;
    if items.len() != 3 {
        return Err(GeometryFault::WrongArity(items.len()));
    }

    let mut out = [0.0f32; 3];
    for (axis, item) in items.iter().enumerate() {
        let v = item.as_f64().ok_or(GeometryFault::NotANumber { axis })? as f32;
        if !v.is_finite() {
            return Err(GeometryFault::NotFinite { axis });
        }
        out[axis] = v;
    }
    Ok(out)
}

fn parse_cluster(value: Option<&Value>) -> i32 {
    let Some(value) = value else {
        return 0;
    };

    let parsed = match value {
        Value::Null => Some(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|c| i32::try_from(c).ok()),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        log::debug!("Unusable cluster label {value}; defaulting to 0");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_dataset_uses_keys_as_ids() {
        let data = json!({
            "id0": { "point": [1.0, 2.0, 3.0], "cluster": 2 },
            "id1": [4, 5, 6],
        });

        let records = parse_dataset(&data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "id0");
        assert_eq!(records[0].geometry, Ok([1.0, 2.0, 3.0]));
        assert_eq!(records[0].cluster, 2);
        assert_eq!(records[1].id, "id1");
        assert_eq!(records[1].source, GeometrySource::Bare);
        assert_eq!(records[1].cluster, 0);
    }

    #[test]
    fn array_dataset_prefers_explicit_ids() {
        let data = json!([
            { "id": 42, "coordinates": [0, 0, 1] },
            { "id": "doc-7", "point": [0, 1, 0], "cluster": null },
            { "point": [1, 0, 0], "cluster": -1 },
        ]);

        let records = parse_dataset(&data).unwrap();
        assert_eq!(records[0].id, "42");
        assert_eq!(records[0].source, GeometrySource::Coordinates);
        assert_eq!(records[1].id, "doc-7");
        assert_eq!(records[1].cluster, 0);
        assert_eq!(records[2].id, "2");
        assert_eq!(records[2].cluster, -1);
    }

    #[test]
    fn coordinates_take_precedence_over_point() {
        let record = parse_entry("a", &json!({ "coordinates": [1, 1, 1], "point": [2, 2, 2] }));
        assert_eq!(record.source, GeometrySource::Coordinates);
        assert_eq!(record.geometry, Ok([1.0, 1.0, 1.0]));
    }

    #[test]
    fn malformed_geometry_is_reported_not_dropped() {
        let data = json!({
            "short": { "point": [1, 2] },
            "text": { "point": [1, "x", 2] },
            "none": { "cluster": 1 },
            "scalar": 7,
        });

        let records = parse_dataset(&data).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].geometry, Err(GeometryFault::WrongArity(2)));
        assert_eq!(records[1].geometry, Err(GeometryFault::NotANumber { axis: 1 }));
        assert_eq!(records[2].geometry, Err(GeometryFault::Missing));
        assert_eq!(records[2].cluster, 1);
        assert_eq!(records[3].source, GeometrySource::Missing);
    }

    #[test]
    fn overflowing_component_is_not_finite() {
        let record = parse_entry("big", &json!([1e300, 0, 0]));
        assert_eq!(record.geometry, Err(GeometryFault::NotFinite { axis: 0 }));
    }

    #[test]
    fn scalar_dataset_is_rejected() {
        assert_eq!(
            parse_dataset(&json!(3)),
            Err(PointCloudError::UnsupportedDataset("a number"))
        );
    }
}
