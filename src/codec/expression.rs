//! Expression compiler: lowers a wire expression tree into a
//! `FilterExpression`.
//!
//! A node without a command code is a literal. Operator nodes compile their
//! children first and then check arity for their command. Nothing is ever
//! partially built: the first error aborts the whole compile.

use kvproxy_client::protocol::{ExpOp, ExpType as WireExpType, Expression, Value as WireValue};

use super::value::{decode_value, decode_values};
use crate::error::{ProxyError, ProxyResult};
use crate::store::expression::{
    ArithOp, BinaryOp, CompareOp, ExpType, FilterExpression, MetaKind, UnaryOp,
};
use crate::store::Value;

/// Deepest expression tree accepted from the wire.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

pub fn compile_expression(exp: Expression) -> ProxyResult<FilterExpression> {
    compile(exp, 0)
}

fn compile(exp: Expression, depth: usize) -> ProxyResult<FilterExpression> {
    if depth >= MAX_EXPRESSION_DEPTH {
        return Err(ProxyError::protocol(format!(
            "expression nesting exceeds {} levels",
            MAX_EXPRESSION_DEPTH
        )));
    }

    let Some(cmd) = exp.cmd else {
        return compile_literal(exp.val);
    };

    match cmd {
        ExpOp::Let => return compile_let(exp.exps, depth),
        ExpOp::Def => return Err(ProxyError::protocol("def outside of let")),
        ExpOp::Regex => {
            let pattern = string_val(cmd, exp.val)?;
            let bin = exp
                .bin
                .ok_or_else(|| ProxyError::protocol("regex requires a bin expression"))?;
            no_children(cmd, &exp.exps)?;
            return Ok(FilterExpression::Regex {
                pattern,
                flags: exp.flags.unwrap_or(0),
                bin: Box::new(compile(*bin, depth + 1)?),
            });
        }
        _ => {}
    }

    let children = exp
        .exps
        .into_iter()
        .map(|child| compile(child, depth + 1))
        .collect::<ProxyResult<Vec<_>>>()?;

    let node = match cmd {
        ExpOp::Unknown => {
            no_children(cmd, &children)?;
            FilterExpression::Unknown
        }

        ExpOp::Eq => compare(CompareOp::Eq, children)?,
        ExpOp::Ne => compare(CompareOp::Ne, children)?,
        ExpOp::Gt => compare(CompareOp::Gt, children)?,
        ExpOp::Ge => compare(CompareOp::Ge, children)?,
        ExpOp::Lt => compare(CompareOp::Lt, children)?,
        ExpOp::Le => compare(CompareOp::Le, children)?,
        ExpOp::Geo => {
            let [a, b] = exactly(cmd, children)?;
            FilterExpression::GeoCompare(Box::new(a), Box::new(b))
        }

        ExpOp::And => FilterExpression::And(at_least(cmd, 1, children)?),
        ExpOp::Or => FilterExpression::Or(at_least(cmd, 1, children)?),
        ExpOp::Not => {
            let [a] = exactly(cmd, children)?;
            FilterExpression::Not(Box::new(a))
        }
        ExpOp::Exclusive => FilterExpression::Exclusive(at_least(cmd, 2, children)?),

        ExpOp::Add => arith(cmd, ArithOp::Add, 2, children)?,
        ExpOp::Sub => arith(cmd, ArithOp::Sub, 2, children)?,
        ExpOp::Mul => arith(cmd, ArithOp::Mul, 2, children)?,
        ExpOp::Div => arith(cmd, ArithOp::Div, 2, children)?,
        ExpOp::IntAnd => arith(cmd, ArithOp::IntAnd, 2, children)?,
        ExpOp::IntOr => arith(cmd, ArithOp::IntOr, 2, children)?,
        ExpOp::IntXor => arith(cmd, ArithOp::IntXor, 2, children)?,
        ExpOp::Min => arith(cmd, ArithOp::Min, 1, children)?,
        ExpOp::Max => arith(cmd, ArithOp::Max, 1, children)?,

        ExpOp::Pow => binary(cmd, BinaryOp::Pow, children)?,
        ExpOp::Log => binary(cmd, BinaryOp::Log, children)?,
        ExpOp::Mod => binary(cmd, BinaryOp::Mod, children)?,
        ExpOp::IntLShift => binary(cmd, BinaryOp::IntLShift, children)?,
        ExpOp::IntRShift => binary(cmd, BinaryOp::IntRShift, children)?,
        ExpOp::IntARShift => binary(cmd, BinaryOp::IntARShift, children)?,
        ExpOp::IntLScan => binary(cmd, BinaryOp::IntLScan, children)?,
        ExpOp::IntRScan => binary(cmd, BinaryOp::IntRScan, children)?,

        ExpOp::Abs => unary(cmd, UnaryOp::Abs, children)?,
        ExpOp::Floor => unary(cmd, UnaryOp::Floor, children)?,
        ExpOp::Ceil => unary(cmd, UnaryOp::Ceil, children)?,
        ExpOp::ToInt => unary(cmd, UnaryOp::ToInt, children)?,
        ExpOp::ToFloat => unary(cmd, UnaryOp::ToFloat, children)?,
        ExpOp::IntNot => unary(cmd, UnaryOp::IntNot, children)?,
        ExpOp::IntCount => unary(cmd, UnaryOp::IntCount, children)?,

        ExpOp::DeviceSize => meta(cmd, MetaKind::DeviceSize, &children)?,
        ExpOp::LastUpdate => meta(cmd, MetaKind::LastUpdate, &children)?,
        ExpOp::SinceUpdate => meta(cmd, MetaKind::SinceUpdate, &children)?,
        ExpOp::VoidTime => meta(cmd, MetaKind::VoidTime, &children)?,
        ExpOp::Ttl => meta(cmd, MetaKind::Ttl, &children)?,
        ExpOp::SetName => meta(cmd, MetaKind::SetName, &children)?,
        ExpOp::KeyExists => meta(cmd, MetaKind::KeyExists, &children)?,
        ExpOp::IsTombstone => meta(cmd, MetaKind::IsTombstone, &children)?,
        ExpOp::MemorySize => meta(cmd, MetaKind::MemorySize, &children)?,
        ExpOp::RecordSize => meta(cmd, MetaKind::RecordSize, &children)?,

        ExpOp::DigestModulo => {
            no_children(cmd, &children)?;
            match exp.val {
                Some(WireValue::Int(n)) if n > 0 => FilterExpression::DigestModulo(n),
                Some(WireValue::Int(n)) => {
                    return Err(ProxyError::validation(format!(
                        "digest_modulo: modulus must be positive, got {}",
                        n
                    )))
                }
                other => return Err(wrong_val(cmd, "an integer", other.as_ref())),
            }
        }
        ExpOp::Key => {
            no_children(cmd, &children)?;
            FilterExpression::Key(module(cmd, exp.module)?.into())
        }
        ExpOp::Bin => {
            no_children(cmd, &children)?;
            let kind = match module(cmd, exp.module)? {
                WireExpType::Nil | WireExpType::Hll => {
                    return Err(ProxyError::protocol(
                        "bin accessor requires a bool, int, string, list, map, blob, float or geo type",
                    ))
                }
                other => other.into(),
            };
            FilterExpression::Bin {
                name: string_val(cmd, exp.val)?,
                kind,
            }
        }
        ExpOp::BinType => {
            no_children(cmd, &children)?;
            FilterExpression::BinType(string_val(cmd, exp.val)?)
        }
        ExpOp::Var => {
            no_children(cmd, &children)?;
            FilterExpression::Var(string_val(cmd, exp.val)?)
        }
        ExpOp::Quoted => {
            no_children(cmd, &children)?;
            match exp.val {
                Some(WireValue::List(items)) => FilterExpression::List(decode_values(items)?),
                other => return Err(wrong_val(cmd, "a list", other.as_ref())),
            }
        }
        ExpOp::Cond => {
            if children.len() < 3 || children.len() % 2 == 0 {
                return Err(ProxyError::protocol(format!(
                    "cond takes condition/action pairs plus a default, got {} children",
                    children.len()
                )));
            }
            FilterExpression::Cond(children)
        }

        ExpOp::Regex | ExpOp::Let | ExpOp::Def => {
            return Err(ProxyError::protocol(format!("{:?} is not valid here", cmd)))
        }
    };
    Ok(node)
}

fn compile_literal(val: Option<WireValue>) -> ProxyResult<FilterExpression> {
    // An absent value is the nil literal, as in the value codec.
    let Some(val) = val else {
        return Ok(FilterExpression::Nil);
    };
    let node = match decode_value(val)? {
        Value::Nil => FilterExpression::Nil,
        Value::Int(v) => FilterExpression::Int(v),
        Value::Float(v) => FilterExpression::Float(v),
        Value::String(v) => FilterExpression::String(v),
        Value::Bool(v) => FilterExpression::Bool(v),
        Value::Blob(v) => FilterExpression::Blob(v),
        Value::List(v) => FilterExpression::List(v),
        Value::Map(v) => FilterExpression::Map(v),
        Value::GeoJson(v) => FilterExpression::Geo(v),
        Value::Wildcard => FilterExpression::Wildcard,
        Value::Infinity => FilterExpression::Infinity,
        other @ (Value::Json(_) | Value::Hll(_)) => {
            return Err(ProxyError::protocol(format!(
                "{} literal is not supported in expressions",
                other.type_name()
            )))
        }
    };
    Ok(node)
}

/// `Let` children are `Def` nodes followed by exactly one body expression.
fn compile_let(children: Vec<Expression>, depth: usize) -> ProxyResult<FilterExpression> {
    if children.len() < 2 {
        return Err(ProxyError::protocol(
            "let requires at least one def and a body",
        ));
    }

    let mut defs = Vec::with_capacity(children.len() - 1);
    let mut body = None;
    let last = children.len() - 1;

    for (i, child) in children.into_iter().enumerate() {
        let is_def = child.cmd == Some(ExpOp::Def);
        match (i == last, is_def) {
            (false, true) => {
                let name = string_val(ExpOp::Def, child.val)?;
                let [value] = child.exps.try_into().map_err(|v: Vec<Expression>| {
                    ProxyError::protocol(format!(
                        "def '{}' takes exactly 1 value, got {}",
                        name,
                        v.len()
                    ))
                })?;
                defs.push((name, compile(value, depth + 1)?));
            }
            (false, false) => {
                return Err(ProxyError::protocol(
                    "let expects def nodes before its body",
                ))
            }
            (true, true) => return Err(ProxyError::protocol("let body cannot be a def")),
            (true, false) => body = Some(compile(child, depth + 1)?),
        }
    }

    let body = body.ok_or_else(|| ProxyError::protocol("let has no body"))?;
    Ok(FilterExpression::Let {
        defs,
        body: Box::new(body),
    })
}

// ==================== Helpers ====================

fn compare(op: CompareOp, children: Vec<FilterExpression>) -> ProxyResult<FilterExpression> {
    let [a, b] = children.try_into().map_err(|v: Vec<FilterExpression>| {
        ProxyError::protocol(format!("{:?} takes exactly 2 operands, got {}", op, v.len()))
    })?;
    Ok(FilterExpression::Compare(op, Box::new(a), Box::new(b)))
}

fn arith(
    cmd: ExpOp,
    op: ArithOp,
    min: usize,
    children: Vec<FilterExpression>,
) -> ProxyResult<FilterExpression> {
    Ok(FilterExpression::Arith(op, at_least(cmd, min, children)?))
}

fn binary(
    cmd: ExpOp,
    op: BinaryOp,
    children: Vec<FilterExpression>,
) -> ProxyResult<FilterExpression> {
    let [a, b] = exactly(cmd, children)?;
    Ok(FilterExpression::Binary(op, Box::new(a), Box::new(b)))
}

fn unary(cmd: ExpOp, op: UnaryOp, children: Vec<FilterExpression>) -> ProxyResult<FilterExpression> {
    let [a] = exactly(cmd, children)?;
    Ok(FilterExpression::Unary(op, Box::new(a)))
}

fn meta(cmd: ExpOp, kind: MetaKind, children: &[FilterExpression]) -> ProxyResult<FilterExpression> {
    no_children(cmd, children)?;
    Ok(FilterExpression::Meta(kind))
}

fn exactly<const N: usize>(
    cmd: ExpOp,
    children: Vec<FilterExpression>,
) -> ProxyResult<[FilterExpression; N]> {
    children.try_into().map_err(|v: Vec<FilterExpression>| {
        ProxyError::protocol(format!(
            "{:?} takes exactly {} operand(s), got {}",
            cmd,
            N,
            v.len()
        ))
    })
}

fn at_least(
    cmd: ExpOp,
    min: usize,
    children: Vec<FilterExpression>,
) -> ProxyResult<Vec<FilterExpression>> {
    if children.len() < min {
        return Err(ProxyError::protocol(format!(
            "{:?} takes at least {} operand(s), got {}",
            cmd,
            min,
            children.len()
        )));
    }
    Ok(children)
}

fn no_children<T>(cmd: ExpOp, children: &[T]) -> ProxyResult<()> {
    if children.is_empty() {
        Ok(())
    } else {
        Err(ProxyError::protocol(format!(
            "{:?} takes no operands, got {}",
            cmd,
            children.len()
        )))
    }
}

fn module(cmd: ExpOp, module: Option<WireExpType>) -> ProxyResult<WireExpType> {
    module.ok_or_else(|| ProxyError::protocol(format!("{:?} requires a type tag", cmd)))
}

fn string_val(cmd: ExpOp, val: Option<WireValue>) -> ProxyResult<String> {
    match val {
        Some(WireValue::String(s)) => Ok(s),
        other => Err(wrong_val(cmd, "a string", other.as_ref())),
    }
}

fn wrong_val(cmd: ExpOp, expected: &str, got: Option<&WireValue>) -> ProxyError {
    let got = match got {
        Some(v) => format!("{:?}", v),
        None => "nothing".to_string(),
    };
    ProxyError::protocol(format!("{:?} expects {} value, got {}", cmd, expected, got))
}

impl From<WireExpType> for ExpType {
    fn from(t: WireExpType) -> Self {
        match t {
            WireExpType::Nil => ExpType::Nil,
            WireExpType::Bool => ExpType::Bool,
            WireExpType::Int => ExpType::Int,
            WireExpType::String => ExpType::String,
            WireExpType::List => ExpType::List,
            WireExpType::Map => ExpType::Map,
            WireExpType::Blob => ExpType::Blob,
            WireExpType::Float => ExpType::Float,
            WireExpType::Geo => ExpType::Geo,
            WireExpType::Hll => ExpType::Hll,
        }
    }
}
