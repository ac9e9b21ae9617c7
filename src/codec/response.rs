//! Response encoder.
//!
//! Every `error` field goes through [`encode_error`]: a store error is
//! always reported, and an in-doubt outcome without an error is reported as
//! result code 0 with `in_doubt` set. Only a clean outcome encodes as `None`.

use kvproxy_client::protocol::{self as wire, ErrorInfo, Response};

use super::admin::{encode_role, encode_udf_meta, encode_user};
use super::key::{encode_key, encode_record};
use super::value::encode_value;
use crate::store::{
    result_code, BatchRecord, BatchResults, Record, RecordResult, Role, StoreError, StoreResult,
    UdfMeta, UserRoles, Value,
};

pub fn encode_error(error: Option<&StoreError>, in_doubt: bool) -> Option<ErrorInfo> {
    match error {
        Some(err) => Some(ErrorInfo {
            result_code: err.result_code,
            in_doubt: err.in_doubt || in_doubt,
        }),
        None if in_doubt => Some(ErrorInfo {
            result_code: result_code::OK,
            in_doubt: true,
        }),
        None => None,
    }
}

fn store_error<T>(result: &StoreResult<T>) -> Option<ErrorInfo> {
    encode_error(result.as_ref().err(), false)
}

pub fn single(result: StoreResult<Record>) -> Response {
    let error = store_error(&result);
    Response::Single {
        record: result.ok().map(encode_record),
        error,
    }
}

pub fn exists(result: StoreResult<bool>) -> Response {
    let error = store_error(&result);
    Response::Exists {
        exists: result.unwrap_or(false),
        error,
    }
}

pub fn delete(result: StoreResult<bool>) -> Response {
    let error = store_error(&result);
    Response::Delete {
        existed: result.unwrap_or(false),
        error,
    }
}

pub fn status(result: StoreResult<()>) -> Response {
    Response::status(store_error(&result))
}

pub fn batch_record(record: BatchRecord) -> wire::BatchRecord {
    wire::BatchRecord {
        error: encode_error(record.error.as_ref(), record.in_doubt),
        key: Some(encode_key(record.key)),
        record: record.record.map(encode_record),
    }
}

/// Partial results are encoded even when the batch as a whole failed.
pub fn batch(results: BatchResults) -> Response {
    batch_with(results.records.into_iter().map(batch_record).collect(), results.error)
}

pub fn batch_with(records: Vec<wire::BatchRecord>, error: Option<StoreError>) -> Response {
    Response::Batch {
        records,
        error: encode_error(error.as_ref(), false),
    }
}

pub fn udf_list(result: StoreResult<Vec<UdfMeta>>) -> Response {
    let error = store_error(&result);
    Response::UdfList {
        udfs: result
            .map(|udfs| udfs.into_iter().map(encode_udf_meta).collect())
            .unwrap_or_default(),
        error,
    }
}

pub fn udf_result(result: StoreResult<Option<Value>>) -> Response {
    let error = store_error(&result);
    Response::UdfResult {
        result: result.ok().flatten().map(encode_value),
        error,
    }
}

pub fn users(result: StoreResult<Vec<UserRoles>>) -> Response {
    let error = store_error(&result);
    Response::Users {
        users: result
            .map(|users| users.into_iter().map(encode_user).collect())
            .unwrap_or_default(),
        error,
    }
}

pub fn roles(result: StoreResult<Vec<Role>>) -> Response {
    let error = store_error(&result);
    Response::Roles {
        roles: result
            .map(|roles| roles.into_iter().map(encode_role).collect())
            .unwrap_or_default(),
        error,
    }
}

pub fn stream_item(item: RecordResult) -> Response {
    Response::StreamItem {
        error: encode_error(item.error.as_ref(), false),
        record: item.record.map(encode_record),
        bval: item.bval,
    }
}

pub fn stream_end(error: Option<&StoreError>) -> Response {
    Response::StreamEnd {
        error: encode_error(error, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BinMap, Key};

    fn record() -> Record {
        let mut bins = BinMap::new();
        bins.insert("a".to_string(), Value::Int(1));
        Record {
            key: None,
            generation: 1,
            expiration: 0,
            bins,
        }
    }

    #[test]
    fn test_error_synthesis() {
        assert_eq!(encode_error(None, false), None);
        assert_eq!(
            encode_error(None, true),
            Some(ErrorInfo {
                result_code: 0,
                in_doubt: true
            })
        );

        let err = StoreError::key_not_found();
        assert_eq!(
            encode_error(Some(&err), false),
            Some(ErrorInfo {
                result_code: 2,
                in_doubt: false
            })
        );
        assert_eq!(encode_error(Some(&err), true).map(|e| e.in_doubt), Some(true));

        let doubtful = StoreError::new(result_code::TIMEOUT, "timeout").in_doubt();
        assert_eq!(
            encode_error(Some(&doubtful), false),
            Some(ErrorInfo {
                result_code: 9,
                in_doubt: true
            })
        );
    }

    #[test]
    fn test_single_ok_and_error() {
        match single(Ok(record())) {
            Response::Single { record, error } => {
                assert!(error.is_none());
                assert_eq!(record.unwrap().generation, 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        match single(Err(StoreError::key_not_found())) {
            Response::Single { record, error } => {
                assert!(record.is_none());
                assert_eq!(error.unwrap().result_code, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_batch_record_in_doubt_without_error() {
        let key = Key::new("test", "s", Value::Int(1)).unwrap();
        let encoded = batch_record(BatchRecord {
            key,
            record: None,
            error: None,
            in_doubt: true,
        });
        assert_eq!(
            encoded.error,
            Some(ErrorInfo {
                result_code: 0,
                in_doubt: true
            })
        );
        assert!(encoded.key.unwrap().digest.is_some());
    }

    #[test]
    fn test_batch_partial_results_kept() {
        let key = Key::new("test", "s", Value::Int(1)).unwrap();
        let response = batch(BatchResults {
            records: vec![BatchRecord {
                key,
                record: Some(record()),
                error: None,
                in_doubt: false,
            }],
            error: Some(StoreError::new(result_code::TIMEOUT, "timeout")),
        });
        match response {
            Response::Batch { records, error } => {
                assert_eq!(records.len(), 1);
                assert!(records[0].error.is_none());
                assert_eq!(error.unwrap().result_code, 9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_and_stream_end() {
        assert_eq!(status(Ok(())), Response::Status { error: None });
        assert_eq!(stream_end(None), Response::StreamEnd { error: None });

        match stream_item(RecordResult::error(StoreError::unsupported("x"))) {
            Response::StreamItem { record, error, .. } => {
                assert!(record.is_none());
                assert_eq!(error.unwrap().result_code, 16);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
