use kvproxy_client::protocol::{
    CdtListPolicy, ListOp as WireListOp, ListOperation as WireListOperation, ListOrderType,
};

use super::{decode_ctx, list_return_type, Args};
use crate::error::{ProxyError, ProxyResult};
use crate::store::operation::{ListOp, ListOperation, ListOrder, ListPolicy, ListSelector};

/// Highest valid sort flag combination (descending | drop duplicates).
const MAX_SORT_FLAGS: u32 = 3;

pub fn decode_list_operation(wire: WireListOperation) -> ProxyResult<ListOperation> {
    let ctx = decode_ctx(wire.ctx)?;
    let policy = wire.policy.map(ListPolicy::from).unwrap_or_default();
    let label = format!("list {:?}", wire.op);
    let mut args = Args::new(label, wire.args, &[arity(wire.op)])?;

    use WireListOp::*;
    let op = match wire.op {
        Create => ListOp::Create {
            order: list_order(&mut args)?,
            pad: args.flag("pad")?,
            persist_index: args.flag("persist_index")?,
        },
        SetOrder => ListOp::SetOrder(list_order(&mut args)?),
        Append => {
            let mut values = args.list("values")?;
            if values.len() == 1 {
                ListOp::Append {
                    policy,
                    value: values.remove(0),
                }
            } else {
                ListOp::AppendItems { policy, values }
            }
        }
        Insert => {
            let index = args.index("index")?;
            let mut values = args.list("values")?;
            if values.len() == 1 {
                ListOp::Insert {
                    policy,
                    index,
                    value: values.remove(0),
                }
            } else {
                ListOp::InsertItems {
                    policy,
                    index,
                    values,
                }
            }
        }
        Pop => ListOp::Pop(args.index("index")?),
        PopRange => ListOp::PopRange {
            index: args.index("index")?,
            count: args.count("count")?,
        },
        PopRangeFrom => ListOp::PopRangeFrom(args.index("index")?),
        Set => ListOp::Set {
            policy,
            index: args.index("index")?,
            value: args.value("value")?,
        },
        Trim => ListOp::Trim {
            index: args.index("index")?,
            count: args.count("count")?,
        },
        Clear => ListOp::Clear,
        Increment => ListOp::Increment {
            policy,
            index: args.index("index")?,
            delta: args.value("delta")?,
        },
        Size => ListOp::Size,
        Sort => ListOp::Sort(args.flags("sort_flags", MAX_SORT_FLAGS)?),
        RemoveRange => ListOp::RemoveRange {
            index: args.index("index")?,
            count: args.count("count")?,
        },
        RemoveRangeFrom => ListOp::RemoveRangeFrom(args.index("index")?),

        GetByValueList | GetByValueRange | GetByValueRelativeRankRange
        | GetByValueRelativeRankRangeCount | GetByIndex | GetByIndexRange
        | GetByIndexRangeCount | GetByRank | GetByRankRange | GetByRankRangeCount => {
            let rt = list_return_type(args.label(), wire.return_type, wire.inverted)?;
            ListOp::GetBy(selector(wire.op, &mut args)?, rt)
        }

        RemoveByValueList | RemoveByValueRange | RemoveByValueRelativeRankRange
        | RemoveByValueRelativeRankRangeCount | RemoveByIndex | RemoveByIndexRange
        | RemoveByIndexRangeCount | RemoveByRank | RemoveByRankRange
        | RemoveByRankRangeCount => {
            let rt = list_return_type(args.label(), wire.return_type, wire.inverted)?;
            ListOp::RemoveBy(selector(wire.op, &mut args)?, rt)
        }
    };

    Ok(ListOperation {
        bin: wire.bin_name,
        ctx,
        op,
    })
}

fn arity(op: WireListOp) -> usize {
    use WireListOp::*;
    match op {
        Clear | Size => 0,
        SetOrder | Append | Pop | PopRangeFrom | Sort | RemoveRangeFrom | GetByValueList
        | RemoveByValueList | GetByIndex | RemoveByIndex | GetByIndexRange
        | RemoveByIndexRange | GetByRank | RemoveByRank | GetByRankRange | RemoveByRankRange => 1,
        Insert | PopRange | Set | Trim | Increment | RemoveRange | GetByValueRange
        | RemoveByValueRange | GetByValueRelativeRankRange | RemoveByValueRelativeRankRange
        | GetByIndexRangeCount | RemoveByIndexRangeCount | GetByRankRangeCount
        | RemoveByRankRangeCount => 2,
        Create | GetByValueRelativeRankRangeCount | RemoveByValueRelativeRankRangeCount => 3,
    }
}

fn selector(op: WireListOp, args: &mut Args) -> ProxyResult<ListSelector> {
    use WireListOp::*;
    Ok(match op {
        GetByValueList | RemoveByValueList => {
            let mut values = args.list("values")?;
            if values.len() == 1 {
                ListSelector::Value(values.remove(0))
            } else {
                ListSelector::ValueList(values)
            }
        }
        GetByValueRange | RemoveByValueRange => ListSelector::ValueRange {
            begin: args.value("begin")?,
            end: args.value("end")?,
        },
        GetByValueRelativeRankRange | RemoveByValueRelativeRankRange => {
            ListSelector::ValueRelativeRankRange {
                value: args.value("value")?,
                rank: args.index("rank")?,
                count: None,
            }
        }
        GetByValueRelativeRankRangeCount | RemoveByValueRelativeRankRangeCount => {
            ListSelector::ValueRelativeRankRange {
                value: args.value("value")?,
                rank: args.index("rank")?,
                count: Some(args.count("count")?),
            }
        }
        GetByIndex | RemoveByIndex => ListSelector::Index(args.index("index")?),
        GetByIndexRange | RemoveByIndexRange => ListSelector::IndexRange {
            index: args.index("index")?,
            count: None,
        },
        GetByIndexRangeCount | RemoveByIndexRangeCount => ListSelector::IndexRange {
            index: args.index("index")?,
            count: Some(args.count("count")?),
        },
        GetByRank | RemoveByRank => ListSelector::Rank(args.index("rank")?),
        GetByRankRange | RemoveByRankRange => ListSelector::RankRange {
            rank: args.index("rank")?,
            count: None,
        },
        GetByRankRangeCount | RemoveByRankRangeCount => ListSelector::RankRange {
            rank: args.index("rank")?,
            count: Some(args.count("count")?),
        },
        _ => {
            return Err(ProxyError::protocol(format!(
                "{} has no selector",
                args.label()
            )))
        }
    })
}

fn list_order(args: &mut Args) -> ProxyResult<ListOrder> {
    match args.int("order")? {
        0 => Ok(ListOrder::Unordered),
        1 => Ok(ListOrder::Ordered),
        other => Err(ProxyError::protocol(format!(
            "{}: unknown list order {}",
            args.label(),
            other
        ))),
    }
}

impl From<CdtListPolicy> for ListPolicy {
    fn from(p: CdtListPolicy) -> Self {
        ListPolicy {
            order: match p.order {
                ListOrderType::Unordered => ListOrder::Unordered,
                ListOrderType::Ordered => ListOrder::Ordered,
            },
            flags: p.flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::operation::{ReturnKind, ReturnType};
    use crate::store::{Operation, Value};
    use kvproxy_client::protocol::{
        Operation as WireOperation, ReturnType as WireRt, Value as WireValue,
    };

    fn list_op(op: WireListOp, args: Vec<WireValue>) -> WireListOperation {
        match WireOperation::list(op, "b", args) {
            WireOperation::List(l) => l,
            other => panic!("expected list operation, got {:?}", other),
        }
    }

    #[test]
    fn test_append_single_value_collapses() {
        let wire = WireOperation::list(
            WireListOp::Append,
            "b",
            vec![WireValue::List(vec![WireValue::Int(3)])],
        );
        let decoded = crate::codec::operation::decode_operation(wire).unwrap();
        assert_eq!(
            decoded,
            Operation::List(ListOperation {
                bin: "b".to_string(),
                ctx: vec![],
                op: ListOp::Append {
                    policy: ListPolicy::default(),
                    value: Value::Int(3),
                },
            })
        );
    }

    #[test]
    fn test_append_many_values() {
        let decoded = decode_list_operation(list_op(
            WireListOp::Append,
            vec![WireValue::List(vec![WireValue::Int(1), WireValue::Int(2)])],
        ))
        .unwrap();
        assert_eq!(
            decoded.op,
            ListOp::AppendItems {
                policy: ListPolicy::default(),
                values: vec![Value::Int(1), Value::Int(2)],
            }
        );
    }

    #[test]
    fn test_insert_collapse() {
        let decoded = decode_list_operation(list_op(
            WireListOp::Insert,
            vec![WireValue::Int(0), WireValue::List(vec![WireValue::from("x")])],
        ))
        .unwrap();
        assert_eq!(
            decoded.op,
            ListOp::Insert {
                policy: ListPolicy::default(),
                index: 0,
                value: Value::from("x"),
            }
        );
    }

    #[test]
    fn test_create_with_persisted_index() {
        let decoded = decode_list_operation(list_op(
            WireListOp::Create,
            vec![WireValue::Int(1), WireValue::Bool(false), WireValue::Bool(true)],
        ))
        .unwrap();
        assert_eq!(
            decoded.op,
            ListOp::Create {
                order: ListOrder::Ordered,
                pad: false,
                persist_index: true,
            }
        );
    }

    #[test]
    fn test_unknown_list_order_rejected() {
        let bad = decode_list_operation(list_op(
            WireListOp::Create,
            vec![WireValue::Int(2), WireValue::Bool(false), WireValue::Bool(false)],
        ));
        assert!(matches!(bad, Err(ProxyError::Protocol(_))));

        let bad = decode_list_operation(list_op(WireListOp::SetOrder, vec![WireValue::Int(-1)]));
        assert!(matches!(bad, Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_selector_requires_return_type() {
        let wire = list_op(WireListOp::GetByIndex, vec![WireValue::Int(0)]);
        assert!(matches!(
            decode_list_operation(wire),
            Err(ProxyError::Protocol(_))
        ));

        let mut wire = list_op(WireListOp::GetByIndex, vec![WireValue::Int(0)]);
        wire.return_type = Some(WireRt::Key);
        assert!(decode_list_operation(wire).is_err());

        let mut wire = list_op(
            WireListOp::RemoveByValueList,
            vec![WireValue::List(vec![WireValue::Int(9)])],
        );
        wire.return_type = Some(WireRt::Count);
        let decoded = decode_list_operation(wire).unwrap();
        assert_eq!(
            decoded.op,
            ListOp::RemoveBy(
                ListSelector::Value(Value::Int(9)),
                ReturnType::new(ReturnKind::Count)
            )
        );
    }

    #[test]
    fn test_narrowing_errors() {
        let wire = list_op(
            WireListOp::Trim,
            vec![WireValue::Int(0), WireValue::Int(-5)],
        );
        assert!(matches!(
            decode_list_operation(wire),
            Err(ProxyError::Validation(_))
        ));

        let wire = list_op(WireListOp::Sort, vec![WireValue::Int(4)]);
        assert!(matches!(
            decode_list_operation(wire),
            Err(ProxyError::Validation(_))
        ));
    }
}
