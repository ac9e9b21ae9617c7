//! In-process value model handed to the store.

use std::fmt;

/// Particle types used for key digests and query filters.
pub mod particle {
    pub const NULL: i64 = 0;
    pub const INTEGER: i64 = 1;
    pub const FLOAT: i64 = 2;
    pub const STRING: i64 = 3;
    pub const BLOB: i64 = 4;
    pub const BOOL: i64 = 17;
    pub const HLL: i64 = 18;
    pub const MAP: i64 = 19;
    pub const LIST: i64 = 20;
    pub const GEOJSON: i64 = 23;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Blob(Vec<u8>),
    List(Vec<Value>),
    Map(ValueMap),
    /// String-keyed document, order preserved
    Json(Vec<(String, Value)>),
    GeoJson(String),
    Hll(Vec<u8>),
    Wildcard,
    Infinity,
}

impl Value {
    pub fn particle_type(&self) -> i64 {
        match self {
            Value::Nil | Value::Wildcard | Value::Infinity => particle::NULL,
            Value::Int(_) => particle::INTEGER,
            Value::Float(_) => particle::FLOAT,
            Value::String(_) => particle::STRING,
            Value::Bool(_) => particle::BOOL,
            Value::Blob(_) => particle::BLOB,
            Value::List(_) => particle::LIST,
            Value::Map(_) | Value::Json(_) => particle::MAP,
            Value::GeoJson(_) => particle::GEOJSON,
            Value::Hll(_) => particle::HLL,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Blob(_) => "blob",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Json(_) => "json",
            Value::GeoJson(_) => "geojson",
            Value::Hll(_) => "hll",
            Value::Wildcard => "wildcard",
            Value::Infinity => "infinity",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "<nil>"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) | Value::GeoJson(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Blob(v) | Value::Hll(v) => write!(f, "{}", hex::encode(v)),
            Value::List(v) => write!(f, "[{} items]", v.len()),
            Value::Map(v) => write!(f, "{{{} entries}}", v.len()),
            Value::Json(v) => write!(f, "{{{} fields}}", v.len()),
            Value::Wildcard => write!(f, "*"),
            Value::Infinity => write!(f, "INF"),
        }
    }
}

/// Map value. Keys are unique by equality; inserting an existing key
/// replaces its value in place. Equality ignores entry order.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_insert_replaces_existing_key() {
        let mut map = ValueMap::new();
        map.insert(Value::from("a"), Value::Int(1));
        map.insert(Value::from("b"), Value::Int(2));
        map.insert(Value::from("a"), Value::Int(3));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from("a")), Some(&Value::Int(3)));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let left: ValueMap = vec![
            (Value::Int(1), Value::from("x")),
            (Value::Int(2), Value::from("y")),
        ]
        .into_iter()
        .collect();
        let right: ValueMap = vec![
            (Value::Int(2), Value::from("y")),
            (Value::Int(1), Value::from("x")),
        ]
        .into_iter()
        .collect();
        assert_eq!(left, right);

        let different: ValueMap = vec![(Value::Int(1), Value::from("x"))]
            .into_iter()
            .collect();
        assert_ne!(left, different);
    }

    #[test]
    fn test_particle_types() {
        assert_eq!(Value::Int(1).particle_type(), particle::INTEGER);
        assert_eq!(Value::from("s").particle_type(), particle::STRING);
        assert_eq!(Value::Blob(vec![]).particle_type(), particle::BLOB);
        assert_eq!(Value::Map(ValueMap::new()).particle_type(), particle::MAP);
    }
}
