//! Typed record operations, one variant per store sub-operation.
//!
//! Arguments are already narrowed to their native widths; decoding from the
//! positional wire form happens in `codec::operation`.

use super::record::Bin;
use super::value::{Value, ValueMap};

/// One step into a nested list or map.
#[derive(Debug, Clone, PartialEq)]
pub enum CdtContext {
    ListIndex(i32),
    ListRank(i32),
    ListValue(Value),
    MapIndex(i32),
    MapRank(i32),
    MapKey(Value),
    MapValue(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
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

/// Result selector for map and list reads and removals. `inverted` selects
/// everything outside the matched range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnType {
    pub kind: ReturnKind,
    pub inverted: bool,
}

impl ReturnType {
    pub fn new(kind: ReturnKind) -> Self {
        Self {
            kind,
            inverted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapOrder {
    #[default]
    Unordered,
    KeyOrdered,
    KeyValueOrdered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapPolicy {
    pub order: MapOrder,
    pub flags: u32,
    pub persisted_index: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListPolicy {
    pub order: ListOrder,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HllPolicy {
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitPolicy {
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Get,
    GetBin(String),
    GetHeader,
    Put(Bin),
    Add(Bin),
    Append(Bin),
    Prepend(Bin),
    Touch,
    Delete,
    Map(MapOperation),
    List(ListOperation),
    Hll(HllOperation),
    Bit(BitOperation),
}

impl Operation {
    /// Bin addressed by this operation, if any.
    pub fn bin_name(&self) -> Option<&str> {
        match self {
            Operation::GetBin(name) => Some(name),
            Operation::Put(bin)
            | Operation::Add(bin)
            | Operation::Append(bin)
            | Operation::Prepend(bin) => Some(&bin.name),
            Operation::Map(op) => Some(&op.bin),
            Operation::List(op) => Some(&op.bin),
            Operation::Hll(op) => Some(&op.bin),
            Operation::Bit(op) => Some(&op.bin),
            Operation::Get | Operation::GetHeader | Operation::Touch | Operation::Delete => None,
        }
    }

    pub fn is_write(&self) -> bool {
        match self {
            Operation::Put(_)
            | Operation::Add(_)
            | Operation::Append(_)
            | Operation::Prepend(_)
            | Operation::Touch
            | Operation::Delete => true,
            Operation::Get | Operation::GetBin(_) | Operation::GetHeader => false,
            Operation::Map(op) => op.op.is_write(),
            Operation::List(op) => op.op.is_write(),
            Operation::Hll(op) => op.op.is_write(),
            Operation::Bit(op) => op.op.is_write(),
        }
    }
}

// ==================== Map ====================

#[derive(Debug, Clone, PartialEq)]
pub struct MapOperation {
    pub bin: String,
    pub ctx: Vec<CdtContext>,
    pub op: MapOp,
}

/// Which map entries a read or removal addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSelector {
    Key(Value),
    KeyList(Vec<Value>),
    KeyRange { begin: Value, end: Value },
    Value(Value),
    ValueList(Vec<Value>),
    ValueRange { begin: Value, end: Value },
    ValueRelativeRankRange {
        value: Value,
        rank: i32,
        count: Option<u32>,
    },
    Index(i32),
    IndexRange { index: i32, count: Option<u32> },
    Rank(i32),
    RankRange { rank: i32, count: Option<u32> },
    KeyRelativeIndexRange {
        key: Value,
        index: i32,
        count: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    Create(MapOrder),
    SetPolicy(MapPolicy),
    PutItems {
        policy: MapPolicy,
        items: ValueMap,
    },
    Increment {
        policy: MapPolicy,
        key: Value,
        delta: Value,
    },
    Decrement {
        policy: MapPolicy,
        key: Value,
        delta: Value,
    },
    Clear,
    Size,
    GetBy(MapSelector, ReturnType),
    RemoveBy(MapSelector, ReturnType),
}

impl MapOp {
    pub fn is_write(&self) -> bool {
        !matches!(self, MapOp::Size | MapOp::GetBy(..))
    }
}

// ==================== List ====================

#[derive(Debug, Clone, PartialEq)]
pub struct ListOperation {
    pub bin: String,
    pub ctx: Vec<CdtContext>,
    pub op: ListOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListSelector {
    Value(Value),
    ValueList(Vec<Value>),
    ValueRange { begin: Value, end: Value },
    ValueRelativeRankRange {
        value: Value,
        rank: i32,
        count: Option<u32>,
    },
    Index(i32),
    IndexRange { index: i32, count: Option<u32> },
    Rank(i32),
    RankRange { rank: i32, count: Option<u32> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    Create {
        order: ListOrder,
        pad: bool,
        persist_index: bool,
    },
    SetOrder(ListOrder),
    Append {
        policy: ListPolicy,
        value: Value,
    },
    AppendItems {
        policy: ListPolicy,
        values: Vec<Value>,
    },
    Insert {
        policy: ListPolicy,
        index: i32,
        value: Value,
    },
    InsertItems {
        policy: ListPolicy,
        index: i32,
        values: Vec<Value>,
    },
    Pop(i32),
    PopRange {
        index: i32,
        count: u32,
    },
    PopRangeFrom(i32),
    Set {
        policy: ListPolicy,
        index: i32,
        value: Value,
    },
    Trim {
        index: i32,
        count: u32,
    },
    Clear,
    Increment {
        policy: ListPolicy,
        index: i32,
        delta: Value,
    },
    Size,
    Sort(u32),
    RemoveRange {
        index: i32,
        count: u32,
    },
    RemoveRangeFrom(i32),
    GetBy(ListSelector, ReturnType),
    RemoveBy(ListSelector, ReturnType),
}

impl ListOp {
    pub fn is_write(&self) -> bool {
        !matches!(self, ListOp::Size | ListOp::GetBy(..))
    }
}

// ==================== HLL ====================

#[derive(Debug, Clone, PartialEq)]
pub struct HllOperation {
    pub bin: String,
    pub op: HllOp,
}

/// Index and min-hash bit counts accept -1, meaning "keep the bin's
/// current setting".
#[derive(Debug, Clone, PartialEq)]
pub enum HllOp {
    Init {
        policy: HllPolicy,
        index_bits: i8,
        min_hash_bits: i8,
    },
    Add {
        policy: HllPolicy,
        values: Vec<Value>,
        index_bits: i8,
        min_hash_bits: i8,
    },
    SetUnion {
        policy: HllPolicy,
        hlls: Vec<Vec<u8>>,
    },
    RefreshCount,
    Fold(i8),
    GetCount,
    GetUnion(Vec<Vec<u8>>),
    GetUnionCount(Vec<Vec<u8>>),
    GetIntersectCount(Vec<Vec<u8>>),
    GetSimilarity(Vec<Vec<u8>>),
    Describe,
}

impl HllOp {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            HllOp::Init { .. }
                | HllOp::Add { .. }
                | HllOp::SetUnion { .. }
                | HllOp::RefreshCount
                | HllOp::Fold(_)
        )
    }
}

// ==================== Bitwise ====================

#[derive(Debug, Clone, PartialEq)]
pub struct BitOperation {
    pub bin: String,
    pub ctx: Vec<CdtContext>,
    pub op: BitOp,
}

/// Bit window inside a blob bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub offset: i32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowAction {
    #[default]
    Fail,
    Saturate,
    Wrap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BitOp {
    Resize {
        policy: BitPolicy,
        byte_size: u32,
        flags: u32,
    },
    Insert {
        policy: BitPolicy,
        byte_offset: i32,
        value: Vec<u8>,
    },
    Remove {
        policy: BitPolicy,
        byte_offset: i32,
        byte_size: u32,
    },
    Set {
        policy: BitPolicy,
        range: BitRange,
        value: Vec<u8>,
    },
    Or {
        policy: BitPolicy,
        range: BitRange,
        value: Vec<u8>,
    },
    Xor {
        policy: BitPolicy,
        range: BitRange,
        value: Vec<u8>,
    },
    And {
        policy: BitPolicy,
        range: BitRange,
        value: Vec<u8>,
    },
    Not {
        policy: BitPolicy,
        range: BitRange,
    },
    LShift {
        policy: BitPolicy,
        range: BitRange,
        shift: u32,
    },
    RShift {
        policy: BitPolicy,
        range: BitRange,
        shift: u32,
    },
    Add {
        policy: BitPolicy,
        range: BitRange,
        value: i64,
        signed: bool,
        action: OverflowAction,
    },
    Subtract {
        policy: BitPolicy,
        range: BitRange,
        value: i64,
        signed: bool,
        action: OverflowAction,
    },
    SetInt {
        policy: BitPolicy,
        range: BitRange,
        value: i64,
    },
    Get(BitRange),
    Count(BitRange),
    LScan {
        range: BitRange,
        value: bool,
    },
    RScan {
        range: BitRange,
        value: bool,
    },
    GetInt {
        range: BitRange,
        signed: bool,
    },
}

impl BitOp {
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            BitOp::Get(_)
                | BitOp::Count(_)
                | BitOp::LScan { .. }
                | BitOp::RScan { .. }
                | BitOp::GetInt { .. }
        )
    }
}
