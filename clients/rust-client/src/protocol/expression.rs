use super::types::Value;
use serde::{Deserialize, Serialize};

/// Expression command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpOp {
    Unknown,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Regex,
    Geo,
    And,
    Or,
    Not,
    Exclusive,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Log,
    Mod,
    Abs,
    Floor,
    Ceil,
    ToInt,
    ToFloat,
    IntAnd,
    IntOr,
    IntXor,
    IntNot,
    IntLShift,
    IntRShift,
    IntARShift,
    IntCount,
    IntLScan,
    IntRScan,
    Min,
    Max,
    DigestModulo,
    DeviceSize,
    LastUpdate,
    SinceUpdate,
    VoidTime,
    Ttl,
    SetName,
    KeyExists,
    IsTombstone,
    MemorySize,
    RecordSize,
    Key,
    Bin,
    BinType,
    Cond,
    Var,
    Let,
    Def,
    Quoted,
}

/// Value type tag used by bin and key accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpType {
    Nil,
    Bool,
    Int,
    String,
    List,
    Map,
    Blob,
    Float,
    Geo,
    Hll,
}

/// One node of an expression tree. A node without `cmd` is a literal
/// wrapping `val`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<ExpOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Box<Expression>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ExpType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exps: Vec<Expression>,
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            val: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn op(cmd: ExpOp, exps: Vec<Expression>) -> Self {
        Self {
            cmd: Some(cmd),
            exps,
            ..Default::default()
        }
    }

    pub fn bin(kind: ExpType, name: &str) -> Self {
        Self {
            cmd: Some(ExpOp::Bin),
            val: Some(Value::String(name.to_string())),
            module: Some(kind),
            ..Default::default()
        }
    }

    pub fn def(name: &str, value: Expression) -> Self {
        Self {
            cmd: Some(ExpOp::Def),
            val: Some(Value::String(name.to_string())),
            exps: vec![value],
            ..Default::default()
        }
    }

    pub fn var(name: &str) -> Self {
        Self {
            cmd: Some(ExpOp::Var),
            val: Some(Value::String(name.to_string())),
            ..Default::default()
        }
    }

    pub fn regex(pattern: &str, flags: i64, bin: Expression) -> Self {
        Self {
            cmd: Some(ExpOp::Regex),
            val: Some(Value::String(pattern.to_string())),
            flags: Some(flags),
            bin: Some(Box::new(bin)),
            ..Default::default()
        }
    }
}
