use kvproxy_client::protocol::{
    CdtMapPolicy, MapOp as WireMapOp, MapOperation as WireMapOperation, MapOrderType,
};

use super::{decode_ctx, map_return_type, Args};
use crate::error::{ProxyError, ProxyResult};
use crate::store::operation::{MapOp, MapOperation, MapOrder, MapPolicy, MapSelector};

pub fn decode_map_operation(wire: WireMapOperation) -> ProxyResult<MapOperation> {
    let ctx = decode_ctx(wire.ctx)?;
    let policy = wire.policy.map(MapPolicy::from).unwrap_or_default();
    let rt = map_return_type(wire.return_type, wire.inverted);
    let mut args = Args::new(format!("map {:?}", wire.op), wire.args, &[arity(wire.op)])?;

    use WireMapOp::*;
    let op = match wire.op {
        Create => MapOp::Create(map_order(&mut args)?),
        SetPolicy => MapOp::SetPolicy(policy),
        PutItems => MapOp::PutItems {
            policy,
            items: args.map("items")?,
        },
        Increment => MapOp::Increment {
            policy,
            key: args.value("key")?,
            delta: args.value("delta")?,
        },
        Decrement => MapOp::Decrement {
            policy,
            key: args.value("key")?,
            delta: args.value("delta")?,
        },
        Clear => MapOp::Clear,
        Size => MapOp::Size,

        GetByKeyList | GetByKeyRange | GetByValueList | GetByValueRange
        | GetByValueRelativeRankRange | GetByValueRelativeRankRangeCount | GetByIndex
        | GetByIndexRange | GetByIndexRangeCount | GetByRank | GetByRankRange
        | GetByRankRangeCount | GetByKeyRelativeIndexRange | GetByKeyRelativeIndexRangeCount => {
            MapOp::GetBy(selector(wire.op, &mut args)?, rt)
        }

        RemoveByKeyList | RemoveByKeyRange | RemoveByValueList | RemoveByValueRange
        | RemoveByValueRelativeRankRange | RemoveByValueRelativeRankRangeCount
        | RemoveByIndex | RemoveByIndexRange | RemoveByIndexRangeCount | RemoveByRank
        | RemoveByRankRange | RemoveByRankRangeCount | RemoveByKeyRelativeIndexRange
        | RemoveByKeyRelativeIndexRangeCount => {
            MapOp::RemoveBy(selector(wire.op, &mut args)?, rt)
        }
    };

    Ok(MapOperation {
        bin: wire.bin_name,
        ctx,
        op,
    })
}

fn arity(op: WireMapOp) -> usize {
    use WireMapOp::*;
    match op {
        SetPolicy | Clear | Size => 0,
        Create | PutItems | GetByKeyList | RemoveByKeyList | GetByValueList
        | RemoveByValueList | GetByIndex | RemoveByIndex | GetByIndexRange
        | RemoveByIndexRange | GetByRank | RemoveByRank | GetByRankRange | RemoveByRankRange => 1,
        Increment | Decrement | GetByKeyRange | RemoveByKeyRange | GetByValueRange
        | RemoveByValueRange | GetByValueRelativeRankRange | RemoveByValueRelativeRankRange
        | GetByIndexRangeCount | RemoveByIndexRangeCount | GetByRankRangeCount
        | RemoveByRankRangeCount | GetByKeyRelativeIndexRange
        | RemoveByKeyRelativeIndexRange => 2,
        GetByValueRelativeRankRangeCount
        | RemoveByValueRelativeRankRangeCount
        | GetByKeyRelativeIndexRangeCount
        | RemoveByKeyRelativeIndexRangeCount => 3,
    }
}

/// Selector shared by the get-by and remove-by forms of a sub-code.
/// Key and value lists holding exactly one element select that single item.
fn selector(op: WireMapOp, args: &mut Args) -> ProxyResult<MapSelector> {
    use WireMapOp::*;
    Ok(match op {
        GetByKeyList | RemoveByKeyList => {
            let mut keys = args.list("keys")?;
            if keys.len() == 1 {
                MapSelector::Key(keys.remove(0))
            } else {
                MapSelector::KeyList(keys)
            }
        }
        GetByValueList | RemoveByValueList => {
            let mut values = args.list("values")?;
            if values.len() == 1 {
                MapSelector::Value(values.remove(0))
            } else {
                MapSelector::ValueList(values)
            }
        }
        GetByKeyRange | RemoveByKeyRange => MapSelector::KeyRange {
            begin: args.value("begin")?,
            end: args.value("end")?,
        },
        GetByValueRange | RemoveByValueRange => MapSelector::ValueRange {
            begin: args.value("begin")?,
            end: args.value("end")?,
        },
        GetByValueRelativeRankRange | RemoveByValueRelativeRankRange => {
            MapSelector::ValueRelativeRankRange {
                value: args.value("value")?,
                rank: args.index("rank")?,
                count: None,
            }
        }
        GetByValueRelativeRankRangeCount | RemoveByValueRelativeRankRangeCount => {
            MapSelector::ValueRelativeRankRange {
                value: args.value("value")?,
                rank: args.index("rank")?,
                count: Some(args.count("count")?),
            }
        }
        GetByIndex | RemoveByIndex => MapSelector::Index(args.index("index")?),
        GetByIndexRange | RemoveByIndexRange => MapSelector::IndexRange {
            index: args.index("index")?,
            count: None,
        },
        GetByIndexRangeCount | RemoveByIndexRangeCount => MapSelector::IndexRange {
            index: args.index("index")?,
            count: Some(args.count("count")?),
        },
        GetByRank | RemoveByRank => MapSelector::Rank(args.index("rank")?),
        GetByRankRange | RemoveByRankRange => MapSelector::RankRange {
            rank: args.index("rank")?,
            count: None,
        },
        GetByRankRangeCount | RemoveByRankRangeCount => MapSelector::RankRange {
            rank: args.index("rank")?,
            count: Some(args.count("count")?),
        },
        GetByKeyRelativeIndexRange | RemoveByKeyRelativeIndexRange => {
            MapSelector::KeyRelativeIndexRange {
                key: args.value("key")?,
                index: args.index("index")?,
                count: None,
            }
        }
        GetByKeyRelativeIndexRangeCount | RemoveByKeyRelativeIndexRangeCount => {
            MapSelector::KeyRelativeIndexRange {
                key: args.value("key")?,
                index: args.index("index")?,
                count: Some(args.count("count")?),
            }
        }
        Create | SetPolicy | PutItems | Increment | Decrement | Clear | Size => {
            return Err(ProxyError::protocol(format!(
                "{} has no selector",
                args.label()
            )))
        }
    })
}

/// Order codes match the store: 0 unordered, 1 key-ordered,
/// 3 key/value-ordered.
fn map_order(args: &mut Args) -> ProxyResult<MapOrder> {
    match args.int("order")? {
        0 => Ok(MapOrder::Unordered),
        1 => Ok(MapOrder::KeyOrdered),
        3 => Ok(MapOrder::KeyValueOrdered),
        other => Err(ProxyError::protocol(format!(
            "{}: unknown map order {}",
            args.label(),
            other
        ))),
    }
}

impl From<CdtMapPolicy> for MapPolicy {
    fn from(p: CdtMapPolicy) -> Self {
        MapPolicy {
            order: match p.map_order {
                MapOrderType::Unordered => MapOrder::Unordered,
                MapOrderType::KeyOrdered => MapOrder::KeyOrdered,
                MapOrderType::KeyValueOrdered => MapOrder::KeyValueOrdered,
            },
            flags: p.flags,
            persisted_index: p.persisted_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::operation::{ReturnKind, ReturnType};
    use crate::store::{CdtContext, Value};
    use kvproxy_client::protocol::{
        CdtContext as WireCdtContext, CtxType, Operation as WireOperation, ReturnType as WireRt,
        Value as WireValue,
    };

    fn map_op(op: WireMapOp, args: Vec<WireValue>) -> WireMapOperation {
        match WireOperation::map(op, "m", args) {
            WireOperation::Map(m) => m,
            other => panic!("expected map operation, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_by_single_key_list_collapses() {
        let mut wire = map_op(
            WireMapOp::RemoveByKeyList,
            vec![WireValue::List(vec![WireValue::from("k1")])],
        );
        wire.return_type = Some(WireRt::Value);

        let decoded = decode_map_operation(wire).unwrap();
        assert_eq!(decoded.bin, "m");
        assert_eq!(
            decoded.op,
            MapOp::RemoveBy(
                MapSelector::Key(Value::from("k1")),
                ReturnType::new(ReturnKind::Value)
            )
        );
    }

    #[test]
    fn test_multi_key_list_stays_a_list() {
        let wire = map_op(
            WireMapOp::GetByKeyList,
            vec![WireValue::List(vec![
                WireValue::from("a"),
                WireValue::from("b"),
            ])],
        );
        let decoded = decode_map_operation(wire).unwrap();
        assert_eq!(
            decoded.op,
            MapOp::GetBy(
                MapSelector::KeyList(vec![Value::from("a"), Value::from("b")]),
                ReturnType::new(ReturnKind::None)
            )
        );
    }

    #[test]
    fn test_value_list_collapse() {
        let decoded = decode_map_operation(map_op(
            WireMapOp::GetByValueList,
            vec![WireValue::List(vec![WireValue::Int(7)])],
        ))
        .unwrap();
        assert!(matches!(
            decoded.op,
            MapOp::GetBy(MapSelector::Value(Value::Int(7)), _)
        ));
    }

    #[test]
    fn test_increment_uses_policy() {
        let mut wire = map_op(
            WireMapOp::Increment,
            vec![WireValue::from("hits"), WireValue::Int(2)],
        );
        wire.policy = Some(CdtMapPolicy {
            map_order: MapOrderType::KeyOrdered,
            flags: 4,
            persisted_index: false,
        });

        let decoded = decode_map_operation(wire).unwrap();
        assert_eq!(
            decoded.op,
            MapOp::Increment {
                policy: MapPolicy {
                    order: MapOrder::KeyOrdered,
                    flags: 4,
                    persisted_index: false,
                },
                key: Value::from("hits"),
                delta: Value::Int(2),
            }
        );
    }

    #[test]
    fn test_range_count_and_inverted() {
        let mut wire = map_op(
            WireMapOp::RemoveByIndexRangeCount,
            vec![WireValue::Int(-2), WireValue::Int(2)],
        );
        wire.return_type = Some(WireRt::Count);
        wire.inverted = true;

        let decoded = decode_map_operation(wire).unwrap();
        assert_eq!(
            decoded.op,
            MapOp::RemoveBy(
                MapSelector::IndexRange {
                    index: -2,
                    count: Some(2)
                },
                ReturnType {
                    kind: ReturnKind::Count,
                    inverted: true
                }
            )
        );
    }

    #[test]
    fn test_create_order_codes() {
        let decoded =
            decode_map_operation(map_op(WireMapOp::Create, vec![WireValue::Int(3)])).unwrap();
        assert_eq!(decoded.op, MapOp::Create(MapOrder::KeyValueOrdered));

        let bad = decode_map_operation(map_op(WireMapOp::Create, vec![WireValue::Int(2)]));
        assert!(matches!(bad, Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_signature_mismatch() {
        let arity = decode_map_operation(map_op(WireMapOp::GetByIndex, vec![]));
        assert!(matches!(arity, Err(ProxyError::Protocol(_))));

        let variant = decode_map_operation(map_op(
            WireMapOp::RemoveByKeyList,
            vec![WireValue::from("k1")],
        ));
        assert!(matches!(variant, Err(ProxyError::Protocol(_))));

        let put = decode_map_operation(map_op(WireMapOp::PutItems, vec![WireValue::Int(1)]));
        assert!(matches!(put, Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_ctx_attached() {
        let wire = map_op(WireMapOp::Size, vec![]);
        let wire = match WireOperation::Map(wire).with_ctx(vec![WireCdtContext {
            kind: CtxType::MapKey,
            value: Some(WireValue::from("inner")),
        }]) {
            WireOperation::Map(m) => m,
            _ => unreachable!(),
        };
        let decoded = decode_map_operation(wire).unwrap();
        assert_eq!(decoded.ctx, vec![CdtContext::MapKey(Value::from("inner"))]);
        assert_eq!(decoded.op, MapOp::Size);
    }
}
