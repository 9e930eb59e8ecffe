//! Conversion between document values and `serde_json::Value`.
//!
//! JSON is the bridge into typed records (via serde) and the format used for
//! machine-readable output. Locations do not survive the conversion.

use crate::value::{Value, ValueKind};

impl Value {
    /// Convert into a JSON value, dropping locations.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Bool(b) => serde_json::Value::Bool(*b),
            ValueKind::Int(i) => serde_json::Value::from(*i),
            ValueKind::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueKind::String(s) => serde_json::Value::String(s.clone()),
            ValueKind::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            ValueKind::Mapping(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Build a location-less value from JSON.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let kind = match json {
            serde_json::Value::Null => ValueKind::Null,
            serde_json::Value::Bool(b) => ValueKind::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ValueKind::Int(i),
                None => ValueKind::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => ValueKind::String(s.clone()),
            serde_json::Value::Array(items) => {
                ValueKind::Sequence(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(m) => ValueKind::Mapping(
                m.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            ),
        };
        Value::new(kind)
    }
}
