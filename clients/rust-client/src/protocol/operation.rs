//! Wire form of record operations.
//!
//! Every family carries a sub-code plus a positional argument list. The
//! argument schema of each sub-code is fixed and checked by the daemon.

use super::types::{CdtContext, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Operation {
    Std(StdOperation),
    Map(MapOperation),
    List(ListOperation),
    Hll(HllOperation),
    Bitwise(BitwiseOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdOp {
    Get,
    GetHeader,
    Put,
    Add,
    Append,
    Prepend,
    Touch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdOperation {
    pub op: StdOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_name: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Result selector shared by map and list read/remove operations.
/// Map-only kinds are rejected on list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    None,
    Index,
    ReverseIndex,
    Rank,
    ReverseRank,
    Count,
    Key,
    Value,
    KeyValue,
    Exists,
    UnorderedMap,
    OrderedMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapOrderType {
    #[default]
    Unordered,
    KeyOrdered,
    KeyValueOrdered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrderType {
    #[default]
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CdtMapPolicy {
    #[serde(default)]
    pub map_order: MapOrderType,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub persisted_index: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CdtListPolicy {
    #[serde(default)]
    pub order: ListOrderType,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HllPolicy {
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BitwisePolicy {
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapOp {
    Create,
    SetPolicy,
    PutItems,
    Increment,
    Decrement,
    Clear,
    Size,
    RemoveByKeyList,
    RemoveByKeyRange,
    RemoveByValueList,
    RemoveByValueRange,
    RemoveByValueRelativeRankRange,
    RemoveByValueRelativeRankRangeCount,
    RemoveByIndex,
    RemoveByIndexRange,
    RemoveByIndexRangeCount,
    RemoveByRank,
    RemoveByRankRange,
    RemoveByRankRangeCount,
    RemoveByKeyRelativeIndexRange,
    RemoveByKeyRelativeIndexRangeCount,
    GetByKeyList,
    GetByKeyRange,
    GetByValueList,
    GetByValueRange,
    GetByValueRelativeRankRange,
    GetByValueRelativeRankRangeCount,
    GetByIndex,
    GetByIndexRange,
    GetByIndexRangeCount,
    GetByRank,
    GetByRankRange,
    GetByRankRangeCount,
    GetByKeyRelativeIndexRange,
    GetByKeyRelativeIndexRangeCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOperation {
    pub op: MapOp,
    pub bin_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub ctx: Vec<CdtContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CdtMapPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOp {
    Create,
    SetOrder,
    Append,
    Insert,
    Pop,
    PopRange,
    PopRangeFrom,
    Set,
    Trim,
    Clear,
    Increment,
    Size,
    Sort,
    RemoveRange,
    RemoveRangeFrom,
    GetByValueList,
    GetByValueRange,
    GetByValueRelativeRankRange,
    GetByValueRelativeRankRangeCount,
    GetByIndex,
    GetByIndexRange,
    GetByIndexRangeCount,
    GetByRank,
    GetByRankRange,
    GetByRankRangeCount,
    RemoveByValueList,
    RemoveByValueRange,
    RemoveByValueRelativeRankRange,
    RemoveByValueRelativeRankRangeCount,
    RemoveByIndex,
    RemoveByIndexRange,
    RemoveByIndexRangeCount,
    RemoveByRank,
    RemoveByRankRange,
    RemoveByRankRangeCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOperation {
    pub op: ListOp,
    pub bin_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub ctx: Vec<CdtContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CdtListPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HllOp {
    Init,
    Add,
    SetUnion,
    RefreshCount,
    Fold,
    GetCount,
    GetUnion,
    GetUnionCount,
    GetIntersectCount,
    GetSimilarity,
    Describe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HllOperation {
    pub op: HllOp,
    pub bin_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<HllPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitwiseOp {
    Resize,
    Insert,
    Remove,
    Set,
    Or,
    Xor,
    And,
    Not,
    LShift,
    RShift,
    Add,
    Subtract,
    SetInt,
    Get,
    Count,
    LScan,
    RScan,
    GetInt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitwiseOperation {
    pub op: BitwiseOp,
    pub bin_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub ctx: Vec<CdtContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<BitwisePolicy>,
}

impl Operation {
    pub fn get() -> Self {
        Operation::Std(StdOperation {
            op: StdOp::Get,
            bin_name: None,
            args: Vec::new(),
        })
    }

    pub fn get_bin(bin_name: &str) -> Self {
        Operation::Std(StdOperation {
            op: StdOp::Get,
            bin_name: None,
            args: vec![Value::String(bin_name.to_string())],
        })
    }

    pub fn put(bin_name: &str, value: impl Into<Value>) -> Self {
        Operation::Std(StdOperation {
            op: StdOp::Put,
            bin_name: Some(bin_name.to_string()),
            args: vec![value.into()],
        })
    }

    pub fn add(bin_name: &str, value: impl Into<Value>) -> Self {
        Operation::Std(StdOperation {
            op: StdOp::Add,
            bin_name: Some(bin_name.to_string()),
            args: vec![value.into()],
        })
    }

    pub fn map(op: MapOp, bin_name: &str, args: Vec<Value>) -> Self {
        Operation::Map(MapOperation {
            op,
            bin_name: bin_name.to_string(),
            args,
            ctx: Vec::new(),
            return_type: None,
            inverted: false,
            policy: None,
        })
    }

    pub fn list(op: ListOp, bin_name: &str, args: Vec<Value>) -> Self {
        Operation::List(ListOperation {
            op,
            bin_name: bin_name.to_string(),
            args,
            ctx: Vec::new(),
            return_type: None,
            inverted: false,
            policy: None,
        })
    }

    pub fn hll(op: HllOp, bin_name: &str, args: Vec<Value>) -> Self {
        Operation::Hll(HllOperation {
            op,
            bin_name: bin_name.to_string(),
            args,
            policy: None,
        })
    }

    pub fn bitwise(op: BitwiseOp, bin_name: &str, args: Vec<Value>) -> Self {
        Operation::Bitwise(BitwiseOperation {
            op,
            bin_name: bin_name.to_string(),
            args,
            ctx: Vec::new(),
            policy: None,
        })
    }

    /// Sets the result selector on map and list operations; no-op otherwise.
    pub fn with_return_type(mut self, return_type: ReturnType) -> Self {
        match &mut self {
            Operation::Map(m) => m.return_type = Some(return_type),
            Operation::List(l) => l.return_type = Some(return_type),
            _ => {}
        }
        self
    }

    /// Sets the nested context path on CDT operations; no-op otherwise.
    pub fn with_ctx(mut self, ctx: Vec<CdtContext>) -> Self {
        match &mut self {
            Operation::Map(m) => m.ctx = ctx,
            Operation::List(l) => l.ctx = ctx,
            Operation::Bitwise(b) => b.ctx = ctx,
            _ => {}
        }
        self
    }
}
