use std::collections::BTreeMap;

use super::key::Key;
use super::value::Value;

pub type BinMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub name: String,
    pub value: Value,
}

impl Bin {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: Option<Key>,
    pub generation: u32,
    /// Absolute expiration in seconds since the store epoch; 0 means never
    pub expiration: u32,
    pub bins: BinMap,
}
