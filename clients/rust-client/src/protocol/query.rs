use super::admin::IndexCollectionType;
use super::types::{CdtContext, Value};
use serde::{Deserialize, Serialize};

/// Secondary index predicate. `begin == end` expresses equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub name: String,
    #[serde(default)]
    pub idx_type: IndexCollectionType,
    #[serde(default)]
    pub value_particle_type: i64,
    #[serde(default)]
    pub begin: Option<Value>,
    #[serde(default)]
    pub end: Option<Value>,
    #[serde(default)]
    pub ctx: Vec<CdtContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub namespace: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default)]
    pub bin_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryFilter>,
    #[serde(default)]
    pub task_id: u64,
    #[serde(default)]
    pub return_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bval: Option<i64>,
    pub id: u32,
    #[serde(default)]
    pub retry: bool,
    #[serde(default, with = "serde_bytes")]
    pub digest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionFilter {
    #[serde(default)]
    pub begin: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default, with = "serde_bytes")]
    pub digest: Vec<u8>,
    #[serde(default)]
    pub partitions: Vec<PartitionStatus>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub retry: bool,
}

impl PartitionFilter {
    pub fn all() -> Self {
        Self::range(0, 4096)
    }

    pub fn range(begin: u32, count: u32) -> Self {
        Self {
            begin,
            count,
            digest: Vec::new(),
            partitions: Vec::new(),
            done: false,
            retry: false,
        }
    }
}
