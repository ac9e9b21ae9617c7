//! Operation decoder.
//!
//! Dispatches on family, then on sub-code. Each sub-code has one fixed
//! argument signature, checked by [`Args`] before anything is decoded.

mod args;
mod bit;
mod hll;
mod list;
mod map;
mod standard;

use kvproxy_client::protocol::{
    CdtContext as WireCdtContext, CtxType, Operation as WireOperation,
    ReturnType as WireReturnType, Value as WireValue,
};

pub(crate) use args::Args;

use super::value::decode_value;
use crate::error::{ProxyError, ProxyResult};
use crate::store::operation::{ReturnKind, ReturnType};
use crate::store::{CdtContext, Operation};

pub use bit::decode_bit_operation;
pub use hll::decode_hll_operation;
pub use list::decode_list_operation;
pub use map::decode_map_operation;
pub use standard::decode_std_operation;

pub fn decode_operation(op: WireOperation) -> ProxyResult<Operation> {
    match op {
        WireOperation::Std(op) => decode_std_operation(op),
        WireOperation::Map(op) => decode_map_operation(op).map(Operation::Map),
        WireOperation::List(op) => decode_list_operation(op).map(Operation::List),
        WireOperation::Hll(op) => decode_hll_operation(op).map(Operation::Hll),
        WireOperation::Bitwise(op) => decode_bit_operation(op).map(Operation::Bit),
    }
}

pub fn decode_operations(ops: Vec<WireOperation>) -> ProxyResult<Vec<Operation>> {
    ops.into_iter().map(decode_operation).collect()
}

/// Decodes a context path. Index and rank steps take an integer that must
/// fit in i32; key and value steps take any value.
pub fn decode_ctx(ctx: Vec<WireCdtContext>) -> ProxyResult<Vec<CdtContext>> {
    ctx.into_iter().map(decode_ctx_step).collect()
}

fn decode_ctx_step(step: WireCdtContext) -> ProxyResult<CdtContext> {
    let value = step
        .value
        .ok_or_else(|| ProxyError::protocol(format!("context step {:?} has no value", step.kind)))?;

    let position = |value: WireValue| -> ProxyResult<i32> {
        match value {
            WireValue::Int(v) => i32::try_from(v).map_err(|_| {
                ProxyError::validation(format!(
                    "context step {:?}: {} does not fit in i32",
                    step.kind, v
                ))
            }),
            _ => Err(ProxyError::protocol(format!(
                "context step {:?} requires an integer",
                step.kind
            ))),
        }
    };

    Ok(match step.kind {
        CtxType::ListIndex => CdtContext::ListIndex(position(value)?),
        CtxType::ListRank => CdtContext::ListRank(position(value)?),
        CtxType::ListValue => CdtContext::ListValue(decode_value(value)?),
        CtxType::MapIndex => CdtContext::MapIndex(position(value)?),
        CtxType::MapRank => CdtContext::MapRank(position(value)?),
        CtxType::MapKey => CdtContext::MapKey(decode_value(value)?),
        CtxType::MapValue => CdtContext::MapValue(decode_value(value)?),
    })
}

impl From<WireReturnType> for ReturnKind {
    fn from(rt: WireReturnType) -> Self {
        match rt {
            WireReturnType::None => ReturnKind::None,
            WireReturnType::Index => ReturnKind::Index,
            WireReturnType::ReverseIndex => ReturnKind::ReverseIndex,
            WireReturnType::Rank => ReturnKind::Rank,
            WireReturnType::ReverseRank => ReturnKind::ReverseRank,
            WireReturnType::Count => ReturnKind::Count,
            WireReturnType::Key => ReturnKind::Key,
            WireReturnType::Value => ReturnKind::Value,
            WireReturnType::KeyValue => ReturnKind::KeyValue,
            WireReturnType::Exists => ReturnKind::Exists,
            WireReturnType::UnorderedMap => ReturnKind::UnorderedMap,
            WireReturnType::OrderedMap => ReturnKind::OrderedMap,
        }
    }
}

/// Map selectors fall back to `None` when no return type is sent.
fn map_return_type(rt: Option<WireReturnType>, inverted: bool) -> ReturnType {
    ReturnType {
        kind: rt.map_or(ReturnKind::None, Into::into),
        inverted,
    }
}

/// List selectors require an explicit return type, and only the kinds a
/// list can produce.
fn list_return_type(
    label: &str,
    rt: Option<WireReturnType>,
    inverted: bool,
) -> ProxyResult<ReturnType> {
    let rt = rt.ok_or_else(|| ProxyError::protocol(format!("{} requires a return type", label)))?;
    let kind = ReturnKind::from(rt);
    match kind {
        ReturnKind::Key
        | ReturnKind::KeyValue
        | ReturnKind::UnorderedMap
        | ReturnKind::OrderedMap => Err(ProxyError::protocol(format!(
            "{}: return type {:?} is only valid on maps",
            label, kind
        ))),
        _ => Ok(ReturnType { kind, inverted }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    fn step(kind: CtxType, value: Option<WireValue>) -> WireCdtContext {
        WireCdtContext { kind, value }
    }

    #[test]
    fn test_decode_ctx_path() {
        let ctx = decode_ctx(vec![
            step(CtxType::MapKey, Some(WireValue::from("users"))),
            step(CtxType::ListIndex, Some(WireValue::Int(-1))),
            step(CtxType::MapRank, Some(WireValue::Int(0))),
        ])
        .unwrap();
        assert_eq!(
            ctx,
            vec![
                CdtContext::MapKey(Value::from("users")),
                CdtContext::ListIndex(-1),
                CdtContext::MapRank(0),
            ]
        );
    }

    #[test]
    fn test_decode_ctx_errors() {
        let overflow = decode_ctx(vec![step(CtxType::ListIndex, Some(WireValue::Int(1 << 40)))]);
        assert!(matches!(overflow, Err(ProxyError::Validation(_))));

        let wrong = decode_ctx(vec![step(CtxType::ListRank, Some(WireValue::from("x")))]);
        assert!(matches!(wrong, Err(ProxyError::Protocol(_))));

        let missing = decode_ctx(vec![step(CtxType::MapValue, None)]);
        assert!(matches!(missing, Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_map_return_type_defaults_to_none() {
        let rt = map_return_type(None, true);
        assert_eq!(rt.kind, ReturnKind::None);
        assert!(rt.inverted);
    }

    #[test]
    fn test_list_return_type_rules() {
        assert!(list_return_type("list op", None, false).is_err());
        assert!(list_return_type("list op", Some(WireReturnType::KeyValue), false).is_err());
        assert_eq!(
            list_return_type("list op", Some(WireReturnType::Count), false).unwrap(),
            ReturnType::new(ReturnKind::Count)
        );
    }
}
