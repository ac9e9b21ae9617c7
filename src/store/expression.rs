//! Filter and computation expressions evaluated by the store.

use super::value::{Value, ValueMap};

/// Value type of a bin or key accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Record metadata readable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Variadic numeric and integer-bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IntAnd,
    IntOr,
    IntXor,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pow,
    Log,
    Mod,
    IntLShift,
    IntRShift,
    IntARShift,
    IntLScan,
    IntRScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Abs,
    Floor,
    Ceil,
    ToInt,
    ToFloat,
    IntNot,
    IntCount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Nil,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Blob(Vec<u8>),
    List(Vec<Value>),
    Map(ValueMap),
    Geo(String),
    Wildcard,
    Infinity,

    /// Always fails evaluation; used to abort a conditional branch
    Unknown,
    Bin {
        name: String,
        kind: ExpType,
    },
    BinType(String),
    Key(ExpType),
    Meta(MetaKind),
    DigestModulo(i64),

    Compare(CompareOp, Box<FilterExpression>, Box<FilterExpression>),
    GeoCompare(Box<FilterExpression>, Box<FilterExpression>),
    Regex {
        pattern: String,
        flags: i64,
        bin: Box<FilterExpression>,
    },

    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
    Not(Box<FilterExpression>),
    Exclusive(Vec<FilterExpression>),

    Arith(ArithOp, Vec<FilterExpression>),
    Binary(BinaryOp, Box<FilterExpression>, Box<FilterExpression>),
    Unary(UnaryOp, Box<FilterExpression>),

    /// condition, action pairs followed by a default action
    Cond(Vec<FilterExpression>),
    Let {
        defs: Vec<(String, FilterExpression)>,
        body: Box<FilterExpression>,
    },
    Var(String),
}

impl FilterExpression {
    /// Depth of the deepest path from this node to a leaf, counting this node.
    pub fn depth(&self) -> usize {
        let children: Vec<&FilterExpression> = match self {
            FilterExpression::Compare(_, a, b)
            | FilterExpression::GeoCompare(a, b)
            | FilterExpression::Binary(_, a, b) => vec![a, b],
            FilterExpression::Regex { bin, .. } => vec![bin],
            FilterExpression::Not(a) | FilterExpression::Unary(_, a) => vec![a],
            FilterExpression::And(v)
            | FilterExpression::Or(v)
            | FilterExpression::Exclusive(v)
            | FilterExpression::Arith(_, v)
            | FilterExpression::Cond(v) => v.iter().collect(),
            FilterExpression::Let { defs, body } => {
                let mut all: Vec<&FilterExpression> = defs.iter().map(|(_, e)| e).collect();
                all.push(body);
                all
            }
            _ => Vec::new(),
        };
        1 + children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        let leaf = FilterExpression::Int(1);
        assert_eq!(leaf.depth(), 1);

        let cmp = FilterExpression::Compare(
            CompareOp::Eq,
            Box::new(FilterExpression::Bin {
                name: "a".to_string(),
                kind: ExpType::Int,
            }),
            Box::new(FilterExpression::Int(1)),
        );
        assert_eq!(cmp.depth(), 2);

        let and = FilterExpression::And(vec![cmp, FilterExpression::Bool(true)]);
        assert_eq!(and.depth(), 3);
    }
}
