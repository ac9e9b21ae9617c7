use kvproxy_client::protocol::{HllOp as WireHllOp, HllOperation as WireHllOperation};

use super::Args;
use crate::error::ProxyResult;
use crate::store::operation::{HllOp, HllOperation, HllPolicy};

pub fn decode_hll_operation(wire: WireHllOperation) -> ProxyResult<HllOperation> {
    let policy = HllPolicy {
        flags: wire.policy.map_or(0, |p| p.flags),
    };
    let mut args = Args::new(format!("hll {:?}", wire.op), wire.args, &[arity(wire.op)])?;

    let op = match wire.op {
        WireHllOp::Init => HllOp::Init {
            policy,
            index_bits: args.bits("index_bits")?,
            min_hash_bits: args.bits("min_hash_bits")?,
        },
        WireHllOp::Add => HllOp::Add {
            policy,
            values: args.list("values")?,
            index_bits: args.bits("index_bits")?,
            min_hash_bits: args.bits("min_hash_bits")?,
        },
        WireHllOp::SetUnion => HllOp::SetUnion {
            policy,
            hlls: args.hll_list("hlls")?,
        },
        WireHllOp::RefreshCount => HllOp::RefreshCount,
        WireHllOp::Fold => HllOp::Fold(args.bits("index_bits")?),
        WireHllOp::GetCount => HllOp::GetCount,
        WireHllOp::GetUnion => HllOp::GetUnion(args.hll_list("hlls")?),
        WireHllOp::GetUnionCount => HllOp::GetUnionCount(args.hll_list("hlls")?),
        WireHllOp::GetIntersectCount => HllOp::GetIntersectCount(args.hll_list("hlls")?),
        WireHllOp::GetSimilarity => HllOp::GetSimilarity(args.hll_list("hlls")?),
        WireHllOp::Describe => HllOp::Describe,
    };

    Ok(HllOperation {
        bin: wire.bin_name,
        op,
    })
}

fn arity(op: WireHllOp) -> usize {
    match op {
        WireHllOp::RefreshCount | WireHllOp::GetCount | WireHllOp::Describe => 0,
        WireHllOp::SetUnion
        | WireHllOp::Fold
        | WireHllOp::GetUnion
        | WireHllOp::GetUnionCount
        | WireHllOp::GetIntersectCount
        | WireHllOp::GetSimilarity => 1,
        WireHllOp::Init => 2,
        WireHllOp::Add => 3,
    }
}
