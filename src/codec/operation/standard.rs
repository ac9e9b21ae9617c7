use kvproxy_client::protocol::{StdOp, StdOperation};

use super::Args;
use crate::error::{ProxyError, ProxyResult};
use crate::store::{Bin, Operation};

/// Standard single-bin operations.
///
/// `Get` reads one bin when a bin name is given (either in `bin_name` or
/// as the sole argument) and the whole record otherwise. Writes need a bin
/// name and exactly one value.
pub fn decode_std_operation(op: StdOperation) -> ProxyResult<Operation> {
    let label = format!("std {:?}", op.op);

    match op.op {
        StdOp::Get => match op.bin_name {
            Some(name) => {
                Args::new(label, op.args, &[0])?;
                Ok(Operation::GetBin(name))
            }
            None => {
                let empty = op.args.is_empty();
                let mut args = Args::new(label, op.args, &[0, 1])?;
                if empty {
                    Ok(Operation::Get)
                } else {
                    Ok(Operation::GetBin(args.string("bin_name")?))
                }
            }
        },
        StdOp::GetHeader => no_args(label, op.args).map(|_| Operation::GetHeader),
        StdOp::Touch => no_args(label, op.args).map(|_| Operation::Touch),
        StdOp::Delete => no_args(label, op.args).map(|_| Operation::Delete),
        StdOp::Put => write_bin(label, op).map(Operation::Put),
        StdOp::Add => write_bin(label, op).map(Operation::Add),
        StdOp::Append => write_bin(label, op).map(Operation::Append),
        StdOp::Prepend => write_bin(label, op).map(Operation::Prepend),
    }
}

fn no_args(label: String, args: Vec<kvproxy_client::protocol::Value>) -> ProxyResult<()> {
    Args::new(label, args, &[0]).map(|_| ())
}

fn write_bin(label: String, op: StdOperation) -> ProxyResult<Bin> {
    let name = op
        .bin_name
        .ok_or_else(|| ProxyError::protocol(format!("{} requires a bin name", label)))?;
    let mut args = Args::new(label, op.args, &[1])?;
    Ok(Bin::new(name, args.value("value")?))
}
