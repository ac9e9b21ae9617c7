use kvproxy_client::protocol::BatchOperate;

use super::key::decode_key;
use super::operation::decode_operations;
use super::policy::{
    decode_batch_delete_policy, decode_batch_read_policy, decode_batch_udf_policy,
    decode_batch_write_policy,
};
use super::value::decode_values;
use crate::error::ProxyResult;
use crate::store::{BatchItem, ReadSelection};

/// Decodes one batch item.
///
/// A read selects, in order of precedence: the named bins, the operation
/// list, all bins (when `read_all_bins` is set), or the header only.
pub fn decode_batch_item(item: BatchOperate) -> ProxyResult<BatchItem> {
    match item {
        BatchOperate::Read {
            key,
            policy,
            bin_names,
            read_all_bins,
            ops,
        } => {
            let selection = if !bin_names.is_empty() {
                ReadSelection::Bins(bin_names)
            } else if !ops.is_empty() {
                ReadSelection::Operations(decode_operations(ops)?)
            } else if read_all_bins {
                ReadSelection::AllBins
            } else {
                ReadSelection::HeaderOnly
            };
            Ok(BatchItem::Read {
                key: decode_key(key)?,
                policy: decode_batch_read_policy(policy)?,
                selection,
            })
        }
        BatchOperate::Write { key, policy, ops } => Ok(BatchItem::Write {
            key: decode_key(key)?,
            policy: decode_batch_write_policy(policy)?,
            ops: decode_operations(ops)?,
        }),
        BatchOperate::Delete { key, policy } => Ok(BatchItem::Delete {
            key: decode_key(key)?,
            policy: decode_batch_delete_policy(policy)?,
        }),
        BatchOperate::Udf {
            key,
            policy,
            package_name,
            function_name,
            function_args,
        } => Ok(BatchItem::Udf {
            key: decode_key(key)?,
            policy: decode_batch_udf_policy(policy)?,
            package_name,
            function_name,
            args: decode_values(function_args)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use crate::store::{Operation, Value};
    use kvproxy_client::protocol::{Key, Operation as WireOperation};

    fn key() -> Key {
        Key::new("test", "s", "k")
    }

    fn selection(item: BatchOperate) -> ReadSelection {
        match decode_batch_item(item).unwrap() {
            BatchItem::Read { selection, .. } => selection,
            other => panic!("expected read, got {:?}", other),
        }
    }

    #[test]
    fn test_read_selection_precedence() {
        let both = BatchOperate::Read {
            key: key(),
            policy: None,
            bin_names: vec!["a".to_string()],
            read_all_bins: true,
            ops: vec![WireOperation::get()],
        };
        assert_eq!(selection(both), ReadSelection::Bins(vec!["a".to_string()]));

        let ops = BatchOperate::Read {
            key: key(),
            policy: None,
            bin_names: vec![],
            read_all_bins: true,
            ops: vec![WireOperation::get()],
        };
        assert_eq!(
            selection(ops),
            ReadSelection::Operations(vec![Operation::Get])
        );

        assert_eq!(selection(BatchOperate::read_all(key())), ReadSelection::AllBins);

        let header = BatchOperate::Read {
            key: key(),
            policy: None,
            bin_names: vec![],
            read_all_bins: false,
            ops: vec![],
        };
        assert_eq!(selection(header), ReadSelection::HeaderOnly);
    }

    #[test]
    fn test_udf_item() {
        let item = decode_batch_item(BatchOperate::Udf {
            key: key(),
            policy: None,
            package_name: "pkg".to_string(),
            function_name: "fn".to_string(),
            function_args: vec![kvproxy_client::protocol::Value::Int(1)],
        })
        .unwrap();
        match item {
            BatchItem::Udf { args, package_name, .. } => {
                assert_eq!(package_name, "pkg");
                assert_eq!(args, vec![Value::Int(1)]);
            }
            other => panic!("expected udf, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_operation_fails_item() {
        let bad = BatchOperate::Write {
            key: key(),
            policy: None,
            ops: vec![WireOperation::list(
                kvproxy_client::protocol::ListOp::Pop,
                "l",
                vec![],
            )],
        };
        let err = decode_batch_item(bad).unwrap_err();
        assert!(matches!(err, ProxyError::Protocol(_)));

        assert!(decode_batch_item(BatchOperate::delete(key())).is_ok());
    }
}
