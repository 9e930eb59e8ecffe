//! Core document value type.

use crate::location::Location;
use indexmap::IndexMap;

/// Ordered mapping from string keys to values.
pub type Mapping = IndexMap<String, Value>;

/// A document value with the source locations it was defined at.
///
/// `locations` is usually a single entry. Merging two mappings accumulates
/// the locations of both sides, so a node defined in several files lists all
/// of them; the first entry is the primary location used in messages.
///
/// Equality compares the document content only; locations are ignored so
/// that two structurally identical trees compare equal regardless of where
/// they were loaded from.
#[derive(Debug, Clone)]
pub struct Value {
    /// The underlying value
    pub kind: ValueKind,

    /// Source locations for this value (primary first)
    pub locations: Vec<Location>,
}

/// The kind of a document value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl Value {
    /// Create a value without location information.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            locations: Vec::new(),
        }
    }

    /// Create a value located at `location`.
    pub fn located(kind: ValueKind, location: Location) -> Self {
        Self {
            kind,
            locations: vec![location],
        }
    }

    /// Create a null value.
    pub fn null() -> Self {
        Self::new(ValueKind::Null)
    }

    /// Create an empty mapping.
    pub fn empty_mapping() -> Self {
        Self::new(ValueKind::Mapping(Mapping::new()))
    }

    /// Create a mapping from key/value pairs (in order).
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(ValueKind::Mapping(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Create a sequence.
    pub fn sequence(items: Vec<Value>) -> Self {
        Self::new(ValueKind::Sequence(items))
    }

    /// Set the primary location, replacing any existing locations.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations = vec![location];
        self
    }

    /// Set all locations.
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    /// Primary source location, if known.
    pub fn location(&self) -> Option<&Location> {
        self.locations.first()
    }

    /// Append locations not already present.
    pub fn append_locations<'a>(&mut self, locations: impl IntoIterator<Item = &'a Location>) {
        for loc in locations {
            if !self.locations.contains(loc) {
                self.locations.push(loc.clone());
            }
        }
    }

    /// Human-readable name of this value's kind.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ValueKind::Null => "null",
            ValueKind::Bool(_) => "bool",
            ValueKind::Int(_) => "int",
            ValueKind::Float(_) => "float",
            ValueKind::String(_) => "string",
            ValueKind::Sequence(_) => "sequence",
            ValueKind::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, ValueKind::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, ValueKind::Sequence(_))
    }

    /// Whether this is a scalar (including null).
    pub fn is_scalar(&self) -> bool {
        !self.is_mapping() && !self.is_sequence()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Float(f) => Some(f),
            ValueKind::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.kind {
            ValueKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            ValueKind::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match &mut self.kind {
            ValueKind::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Mutable lookup of a key if this is a mapping.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_mapping_mut().and_then(|m| m.get_mut(key))
    }

    /// Insert a key if this is a mapping. Returns false for other kinds.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        match self.as_mapping_mut() {
            Some(map) => {
                map.insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    /// Remove a key (preserving the order of the remaining keys).
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.as_mapping_mut().and_then(|m| m.shift_remove(key))
    }

    /// Render a scalar as it appears inside an interpolated string.
    ///
    /// Returns `None` for null, sequences and mappings.
    pub fn scalar_to_string(&self) -> Option<String> {
        match &self.kind {
            ValueKind::Bool(b) => Some(b.to_string()),
            ValueKind::Int(i) => Some(i.to_string()),
            ValueKind::Float(f) => Some(f.to_string()),
            ValueKind::String(s) => Some(s.clone()),
            ValueKind::Null | ValueKind::Sequence(_) | ValueKind::Mapping(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(ValueKind::Bool(b))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::new(ValueKind::Int(i64::from(i)))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::new(ValueKind::Int(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::new(ValueKind::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(ValueKind::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(ValueKind::String(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::sequence(items)
    }
}
