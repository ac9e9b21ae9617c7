use super::operation::Operation;
use super::policy::{BatchDeletePolicy, BatchReadPolicy, BatchUdfPolicy, BatchWritePolicy};
use super::types::{Key, Value};
use serde::{Deserialize, Serialize};

/// One item of a batch request.
///
/// A read selects bins by name, by operation list, all bins, or (when none of
/// those is given) the record header only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOperate {
    Read {
        key: Key,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<BatchReadPolicy>,
        #[serde(default)]
        bin_names: Vec<String>,
        #[serde(default)]
        read_all_bins: bool,
        #[serde(default)]
        ops: Vec<Operation>,
    },
    Write {
        key: Key,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<BatchWritePolicy>,
        #[serde(default)]
        ops: Vec<Operation>,
    },
    Delete {
        key: Key,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<BatchDeletePolicy>,
    },
    Udf {
        key: Key,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<BatchUdfPolicy>,
        package_name: String,
        function_name: String,
        #[serde(default)]
        function_args: Vec<Value>,
    },
}

impl BatchOperate {
    pub fn read_all(key: Key) -> Self {
        BatchOperate::Read {
            key,
            policy: None,
            bin_names: Vec::new(),
            read_all_bins: true,
            ops: Vec::new(),
        }
    }

    pub fn read_bins(key: Key, bin_names: &[&str]) -> Self {
        BatchOperate::Read {
            key,
            policy: None,
            bin_names: bin_names.iter().map(|s| s.to_string()).collect(),
            read_all_bins: false,
            ops: Vec::new(),
        }
    }

    pub fn write(key: Key, ops: Vec<Operation>) -> Self {
        BatchOperate::Write {
            key,
            policy: None,
            ops,
        }
    }

    pub fn delete(key: Key) -> Self {
        BatchOperate::Delete { key, policy: None }
    }

    pub fn key(&self) -> &Key {
        match self {
            BatchOperate::Read { key, .. }
            | BatchOperate::Write { key, .. }
            | BatchOperate::Delete { key, .. }
            | BatchOperate::Udf { key, .. } => key,
        }
    }
}
