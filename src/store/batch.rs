use super::error::StoreError;
use super::key::Key;
use super::operation::Operation;
use super::policy::{BatchDeletePolicy, BatchReadPolicy, BatchUdfPolicy, BatchWritePolicy};
use super::record::Record;
use super::value::Value;

/// What a batch read returns for its key.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadSelection {
    Bins(Vec<String>),
    AllBins,
    HeaderOnly,
    Operations(Vec<Operation>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Read {
        key: Key,
        policy: BatchReadPolicy,
        selection: ReadSelection,
    },
    Write {
        key: Key,
        policy: BatchWritePolicy,
        ops: Vec<Operation>,
    },
    Delete {
        key: Key,
        policy: BatchDeletePolicy,
    },
    Udf {
        key: Key,
        policy: BatchUdfPolicy,
        package_name: String,
        function_name: String,
        args: Vec<Value>,
    },
}

impl BatchItem {
    pub fn key(&self) -> &Key {
        match self {
            BatchItem::Read { key, .. }
            | BatchItem::Write { key, .. }
            | BatchItem::Delete { key, .. }
            | BatchItem::Udf { key, .. } => key,
        }
    }
}

/// Per-item outcome of a batch call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub key: Key,
    pub record: Option<Record>,
    pub error: Option<StoreError>,
    pub in_doubt: bool,
}

/// Outcome of a whole batch call. `error` is set when the batch could not
/// be completed; `records` still holds whatever was collected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResults {
    pub records: Vec<BatchRecord>,
    pub error: Option<StoreError>,
}
