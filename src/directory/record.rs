//! Raw node records and lenient field parsing
//!
//! Records arrive from a document store or a JSON payload with
//! heterogeneous, optional fields. Every field is kept as a loose JSON value
//! here and only interpreted during normalization, so a malformed field can
//! be repaired instead of failing the whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node record as delivered by the data-access collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNodeRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,

    #[serde(rename = "mongoId", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,

    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<Value>,

    #[serde(rename = "regionId", default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_kg: Option<Value>,

    /// GeoJSON point: `{"type": "Point", "coordinates": [lon, lat]}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}

impl RawNodeRecord {
    /// Convenience constructor used by fixtures and in-memory sources.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            object_id: Some(Value::String(id.into())),
            node_type: Some(Value::String(node_type.into())),
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity_kg: f64) -> Self {
        self.capacity_kg = Some(Value::from(capacity_kg));
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(serde_json::json!({
            "type": "Point",
            "coordinates": [lon, lat],
        }));
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(Value::String(state.into()));
        self
    }

    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(Value::String(district.into()));
        self
    }
}

// =============================================================================
// Lenient Value Parsing
// =============================================================================

/// Read a value as a trimmed, non-empty string.
///
/// Numbers are rendered as text and Mongo extended JSON object ids
/// (`{"$oid": "..."}`) are unwrapped.
pub(crate) fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => value_as_string(map.get("$oid")),
        _ => None,
    }
}

/// Read a value as a finite number; numeric strings are accepted.
pub(crate) fn value_as_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Extract `(lat, lon)` from a GeoJSON point.
pub(crate) fn value_as_coordinates(value: Option<&Value>) -> Option<(f64, f64)> {
    let coordinates = value?.get("coordinates")?.as_array()?;
    if coordinates.len() != 2 {
        return None;
    }
    let lon = value_as_f64(coordinates.first())?;
    let lat = value_as_f64(coordinates.get(1))?;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_string_variants() {
        assert_eq!(value_as_string(Some(&json!("  wh-1 "))), Some("wh-1".into()));
        assert_eq!(value_as_string(Some(&json!(42))), Some("42".into()));
        assert_eq!(
            value_as_string(Some(&json!({"$oid": "65f0c0ffee"}))),
            Some("65f0c0ffee".into())
        );
        assert_eq!(value_as_string(Some(&json!("   "))), None);
        assert_eq!(value_as_string(Some(&json!(null))), None);
        assert_eq!(value_as_string(None), None);
    }

    #[test]
    fn test_value_as_f64_is_permissive() {
        assert_eq!(value_as_f64(Some(&json!(12.5))), Some(12.5));
        assert_eq!(value_as_f64(Some(&json!(" 300 "))), Some(300.0));
        assert_eq!(value_as_f64(Some(&json!("lots"))), None);
        assert_eq!(value_as_f64(Some(&json!("NaN"))), None);
        assert_eq!(value_as_f64(Some(&json!(true))), None);
    }

    #[test]
    fn test_coordinates_are_lon_lat() {
        let location = json!({"type": "Point", "coordinates": [77.59, 12.97]});
        assert_eq!(value_as_coordinates(Some(&location)), Some((12.97, 77.59)));

        let short = json!({"coordinates": [77.59]});
        assert_eq!(value_as_coordinates(Some(&short)), None);

        let garbage = json!({"coordinates": ["east", "north"]});
        assert_eq!(value_as_coordinates(Some(&garbage)), None);

        assert_eq!(value_as_coordinates(Some(&json!("12.97,77.59"))), None);
    }

    #[test]
    fn test_record_deserializes_from_document() {
        let doc = json!({
            "_id": {"$oid": "abc123"},
            "nodeId": "WH-07",
            "type": "Warehouse",
            "capacity_kg": "8000",
            "location": {"type": "Point", "coordinates": [80.2, 13.0]},
            "unrelated": [1, 2, 3],
        });
        let record: RawNodeRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(value_as_string(record.object_id.as_ref()), Some("abc123".into()));
        assert_eq!(value_as_f64(record.capacity_kg.as_ref()), Some(8000.0));
    }
}
