use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tagged value as exchanged on the wire.
///
/// Exactly one variant is carried per value. `Wildcard` and `Infinity` are
/// markers that only make sense inside expressions and range selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Blob(#[serde(with = "serde_bytes")] Vec<u8>),
    List(Vec<Value>),
    Map(Vec<MapEntry>),
    Json(Vec<JsonEntry>),
    Geo(String),
    Hll(#[serde(with = "serde_bytes")] Vec<u8>),
    Wildcard,
    Infinity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub k: Value,
    pub v: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEntry {
    pub k: String,
    pub v: Value,
}

impl Value {
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| MapEntry { k, v }).collect())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Record identity. Requests carry a user value, responses carry the digest
/// and usually echo the user value back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub namespace: String,
    #[serde(default)]
    pub set: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_bytes"
    )]
    pub digest: Option<Vec<u8>>,
}

impl Key {
    pub fn new(namespace: &str, set: &str, value: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: set.to_string(),
            value: Some(value.into()),
            digest: None,
        }
    }

    pub fn from_digest(namespace: &str, set: &str, digest: Vec<u8>) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: set.to_string(),
            value: None,
            digest: Some(digest),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Bin {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub key: Option<Key>,
    pub generation: u32,
    pub expiration: u32,
    #[serde(default)]
    pub bins: BTreeMap<String, Value>,
}

/// Store-side outcome attached to a response. Present whenever the store
/// reported a failure or the write is in doubt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub result_code: i32,
    pub in_doubt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    #[serde(default)]
    pub key: Option<Key>,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Addressing kind of one CDT context step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtxType {
    ListIndex,
    ListRank,
    ListValue,
    MapIndex,
    MapRank,
    MapKey,
    MapValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdtContext {
    pub kind: CtxType,
    #[serde(default)]
    pub value: Option<Value>,
}
