//! Batch handler.
//!
//! Items are decoded one by one. An item that fails to decode is answered
//! in place with a parameter error and its own key; the remaining items are
//! still sent to the store.

use super::DriverHandler;
use crate::codec::{decode_batch_item, decode_batch_policy, response};
use crate::error::ProxyResult;
use crate::store::{result_code, BatchRecord, StoreError};

use kvproxy_client::protocol::{self as wire, BatchOperate, BatchPolicy, ErrorInfo, Response};

/// Position of one request item in the reply.
enum Slot {
    Rejected(wire::Key),
    Sent(wire::Key),
}

pub async fn handle_batch_operate(
    handler: &DriverHandler,
    policy: Option<BatchPolicy>,
    records: Vec<BatchOperate>,
) -> ProxyResult<Response> {
    let policy = decode_batch_policy(policy)?;

    let mut slots = Vec::with_capacity(records.len());
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let key = record.key().clone();
        match decode_batch_item(record) {
            Ok(item) => {
                items.push(item);
                slots.push(Slot::Sent(key));
            }
            Err(e) => {
                tracing::warn!("Rejected batch item: {}", e);
                slots.push(Slot::Rejected(key));
            }
        }
    }

    let results = if items.is_empty() {
        Default::default()
    } else {
        handler.store.batch_operate(&policy, items).await
    };

    let records = merge_results(slots, results.records, results.error.as_ref());
    Ok(response::batch_with(records, results.error))
}

/// Pairs store results with the items that were sent, in order.
///
/// Every request item gets exactly one reply record. Sent items the store
/// did not answer carry the batch error, or SERVER_ERROR when there is none.
fn merge_results(
    slots: Vec<Slot>,
    stored: Vec<BatchRecord>,
    batch_error: Option<&StoreError>,
) -> Vec<wire::BatchRecord> {
    let sent = slots.iter().filter(|s| matches!(s, Slot::Sent(_))).count();
    if stored.len() != sent {
        tracing::warn!(
            "Store answered {} of {} batch items",
            stored.len(),
            sent
        );
    }

    let mut stored = stored.into_iter().map(response::batch_record);
    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Rejected(key) => item_error(key, result_code::PARAMETER_ERROR, false),
            Slot::Sent(key) => stored.next().unwrap_or_else(|| match batch_error {
                Some(e) => item_error(key, e.result_code, e.in_doubt),
                None => item_error(key, result_code::SERVER_ERROR, false),
            }),
        })
        .collect()
}

fn item_error(key: wire::Key, result_code: i32, in_doubt: bool) -> wire::BatchRecord {
    wire::BatchRecord {
        key: Some(key),
        record: None,
        error: Some(ErrorInfo {
            result_code,
            in_doubt,
        }),
    }
}
