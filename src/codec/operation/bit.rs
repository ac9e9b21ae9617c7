use kvproxy_client::protocol::{BitwiseOp, BitwiseOperation};

use super::{decode_ctx, Args};
use crate::error::{ProxyError, ProxyResult};
use crate::store::operation::{BitOp, BitOperation, BitPolicy, BitRange, OverflowAction};

/// Highest valid resize flag combination (from-front | grow-only | shrink-only).
const MAX_RESIZE_FLAGS: u32 = 7;

pub fn decode_bit_operation(wire: BitwiseOperation) -> ProxyResult<BitOperation> {
    let ctx = decode_ctx(wire.ctx)?;
    let policy = BitPolicy {
        flags: wire.policy.map_or(0, |p| p.flags),
    };
    let mut args = Args::new(
        format!("bitwise {:?}", wire.op),
        wire.args,
        &[arity(wire.op)],
    )?;

    let op = match wire.op {
        BitwiseOp::Resize => BitOp::Resize {
            policy,
            byte_size: args.count("byte_size")?,
            flags: args.flags("resize_flags", MAX_RESIZE_FLAGS)?,
        },
        BitwiseOp::Insert => BitOp::Insert {
            policy,
            byte_offset: args.index("byte_offset")?,
            value: args.blob("value")?,
        },
        BitwiseOp::Remove => BitOp::Remove {
            policy,
            byte_offset: args.index("byte_offset")?,
            byte_size: args.count("byte_size")?,
        },
        BitwiseOp::Set => BitOp::Set {
            policy,
            range: range(&mut args)?,
            value: args.blob("value")?,
        },
        BitwiseOp::Or => BitOp::Or {
            policy,
            range: range(&mut args)?,
            value: args.blob("value")?,
        },
        BitwiseOp::Xor => BitOp::Xor {
            policy,
            range: range(&mut args)?,
            value: args.blob("value")?,
        },
        BitwiseOp::And => BitOp::And {
            policy,
            range: range(&mut args)?,
            value: args.blob("value")?,
        },
        BitwiseOp::Not => BitOp::Not {
            policy,
            range: range(&mut args)?,
        },
        BitwiseOp::LShift => BitOp::LShift {
            policy,
            range: range(&mut args)?,
            shift: args.count("shift")?,
        },
        BitwiseOp::RShift => BitOp::RShift {
            policy,
            range: range(&mut args)?,
            shift: args.count("shift")?,
        },
        BitwiseOp::Add => BitOp::Add {
            policy,
            range: range(&mut args)?,
            value: args.int("value")?,
            signed: args.flag("signed")?,
            action: overflow_action(&mut args)?,
        },
        BitwiseOp::Subtract => BitOp::Subtract {
            policy,
            range: range(&mut args)?,
            value: args.int("value")?,
            signed: args.flag("signed")?,
            action: overflow_action(&mut args)?,
        },
        BitwiseOp::SetInt => BitOp::SetInt {
            policy,
            range: range(&mut args)?,
            value: args.int("value")?,
        },
        BitwiseOp::Get => BitOp::Get(range(&mut args)?),
        BitwiseOp::Count => BitOp::Count(range(&mut args)?),
        BitwiseOp::LScan => BitOp::LScan {
            range: range(&mut args)?,
            value: args.flag("value")?,
        },
        BitwiseOp::RScan => BitOp::RScan {
            range: range(&mut args)?,
            value: args.flag("value")?,
        },
        BitwiseOp::GetInt => BitOp::GetInt {
            range: range(&mut args)?,
            signed: args.flag("signed")?,
        },
    };

    Ok(BitOperation {
        bin: wire.bin_name,
        ctx,
        op,
    })
}

fn arity(op: BitwiseOp) -> usize {
    match op {
        BitwiseOp::Resize
        | BitwiseOp::Insert
        | BitwiseOp::Remove
        | BitwiseOp::Not
        | BitwiseOp::Get
        | BitwiseOp::Count => 2,
        BitwiseOp::Set
        | BitwiseOp::Or
        | BitwiseOp::Xor
        | BitwiseOp::And
        | BitwiseOp::LShift
        | BitwiseOp::RShift
        | BitwiseOp::SetInt
        | BitwiseOp::LScan
        | BitwiseOp::RScan
        | BitwiseOp::GetInt => 3,
        BitwiseOp::Add | BitwiseOp::Subtract => 5,
    }
}

fn range(args: &mut Args) -> ProxyResult<BitRange> {
    Ok(BitRange {
        offset: args.index("bit_offset")?,
        size: args.count("bit_size")?,
    })
}

/// Overflow codes match the store: 0 fail, 2 saturate, 4 wrap.
fn overflow_action(args: &mut Args) -> ProxyResult<OverflowAction> {
    match args.int("overflow_action")? {
        0 => Ok(OverflowAction::Fail),
        2 => Ok(OverflowAction::Saturate),
        4 => Ok(OverflowAction::Wrap),
        other => Err(ProxyError::protocol(format!(
            "{}: unknown overflow action {}",
            args.label(),
            other
        ))),
    }
}
