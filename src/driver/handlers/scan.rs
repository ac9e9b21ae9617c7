//! Streaming scan and query handlers.
//!
//! Results are forwarded one frame per record as they come off the
//! recordset. A store error on a single record travels in that record's
//! frame and the stream goes on; a failed send stops the stream and
//! releases the recordset.

use async_trait::async_trait;

use super::DriverHandler;
use crate::codec::{
    decode_partition_filter, decode_query_policy, decode_scan_policy, decode_statement, response,
};
use crate::store::Recordset;

use kvproxy_client::protocol::{
    DriverError, PartitionFilter as WirePartitionFilter, QueryPolicy as WireQueryPolicy, Response,
    ScanPolicy as WireScanPolicy, Statement as WireStatement,
};

/// Downstream end of a streaming command.
#[async_trait]
pub trait StreamSink: Send {
    async fn send(&mut self, response: Response) -> Result<(), DriverError>;
}

/// Forward every record of `recordset` to `sink`, then a clean `StreamEnd`.
///
/// Returns the number of items handed to the sink. On a send failure the
/// recordset is closed before returning and nothing further is read.
pub async fn forward_records<K>(mut recordset: Recordset, sink: &mut K) -> Result<usize, DriverError>
where
    K: StreamSink + ?Sized,
{
    let mut forwarded = 0;
    while let Some(item) = recordset.next().await {
        forwarded += 1;
        if let Err(e) = sink.send(response::stream_item(item)).await {
            recordset.close();
            return Err(e);
        }
    }
    sink.send(response::stream_end(None)).await?;
    Ok(forwarded)
}

async fn finish<K>(
    sink: &mut K,
    started: crate::store::StoreResult<Recordset>,
) -> Result<(), DriverError>
where
    K: StreamSink + ?Sized,
{
    match started {
        Ok(recordset) => {
            let count = forward_records(recordset, sink).await?;
            tracing::debug!("Streamed {} records", count);
            Ok(())
        }
        Err(err) => {
            tracing::debug!("Stream failed to start: {}", err);
            sink.send(response::stream_end(Some(&err))).await
        }
    }
}

pub async fn handle_scan<K>(
    handler: &DriverHandler,
    sink: &mut K,
    policy: Option<WireScanPolicy>,
    partition_filter: Option<WirePartitionFilter>,
    namespace: String,
    set_name: String,
    bin_names: Vec<String>,
) -> Result<(), DriverError>
where
    K: StreamSink + ?Sized,
{
    let decoded = decode_scan_policy(policy)
        .and_then(|policy| Ok((policy, decode_partition_filter(partition_filter)?)));
    let (policy, partition_filter) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Rejected scan on {}: {}", namespace, e);
            return sink.send(Response::error(e.into())).await;
        }
    };

    let started = handler
        .store
        .scan_partitions(&policy, partition_filter, &namespace, &set_name, bin_names)
        .await;
    finish(sink, started).await
}

pub async fn handle_query<K>(
    handler: &DriverHandler,
    sink: &mut K,
    policy: Option<WireQueryPolicy>,
    statement: WireStatement,
    partition_filter: Option<WirePartitionFilter>,
) -> Result<(), DriverError>
where
    K: StreamSink + ?Sized,
{
    let decoded = decode_query_policy(policy).and_then(|policy| {
        Ok((
            policy,
            decode_statement(statement)?,
            decode_partition_filter(partition_filter)?,
        ))
    });
    let (policy, statement, partition_filter) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Rejected query: {}", e);
            return sink.send(Response::error(e.into())).await;
        }
    };

    let started = handler
        .store
        .query_partitions(&policy, statement, partition_filter)
        .await;
    finish(sink, started).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::{RecordCursor, VecCursor};
    use crate::store::{Record, RecordResult, StoreError};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CollectSink {
        frames: Vec<Response>,
        fail_at: Option<usize>,
    }

    impl CollectSink {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                frames: Vec::new(),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl StreamSink for CollectSink {
        async fn send(&mut self, response: Response) -> Result<(), DriverError> {
            self.frames.push(response);
            if Some(self.frames.len()) == self.fail_at {
                return Err(DriverError::ConnectionError("peer gone".to_string()));
            }
            Ok(())
        }
    }

    struct TrackedCursor {
        inner: VecCursor,
        reads: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RecordCursor for TrackedCursor {
        async fn next(&mut self) -> Option<RecordResult> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.next().await
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn record(n: u32) -> RecordResult {
        RecordResult::record(Record {
            key: None,
            generation: n,
            expiration: 0,
            bins: BTreeMap::new(),
        })
    }

    fn tracked(items: Vec<RecordResult>) -> (Recordset, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let rs = Recordset::new(Box::new(TrackedCursor {
            inner: VecCursor::new(items),
            reads: reads.clone(),
            closes: closes.clone(),
        }));
        (rs, reads, closes)
    }

    #[tokio::test]
    async fn test_forward_all_then_end() {
        let (rs, _, closes) = tracked(vec![record(1), record(2)]);
        let mut sink = CollectSink::new(None);
        assert_eq!(forward_records(rs, &mut sink).await.unwrap(), 2);
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(sink.frames[2], Response::StreamEnd { error: None });
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_failure_stops_and_releases_once() {
        let items = (1..=5).map(record).collect();
        let (rs, reads, closes) = tracked(items);
        let mut sink = CollectSink::new(Some(3));

        assert!(forward_records(rs, &mut sink).await.is_err());
        assert_eq!(sink.frames.len(), 3);
        for (i, frame) in sink.frames.iter().enumerate() {
            match frame {
                Response::StreamItem { record, .. } => {
                    assert_eq!(record.as_ref().unwrap().generation, i as u32 + 1)
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(reads.load(Ordering::SeqCst), 3);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_item_error_does_not_stop_stream() {
        let items = vec![
            record(1),
            RecordResult::error(StoreError::unsupported("filter")),
            record(3),
        ];
        let (rs, _, closes) = tracked(items);
        let mut sink = CollectSink::new(None);
        assert_eq!(forward_records(rs, &mut sink).await.unwrap(), 3);
        match &sink.frames[1] {
            Response::StreamItem { record, error, .. } => {
                assert!(record.is_none());
                assert_eq!(error.unwrap().result_code, 16);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sink.frames.len(), 4);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_start_sends_end_with_error() {
        let mut sink = CollectSink::new(None);
        finish(&mut sink, Err(StoreError::parameter("no such namespace")))
            .await
            .unwrap();
        match &sink.frames[..] {
            [Response::StreamEnd { error: Some(err) }] => assert_eq!(err.result_code, 4),
            other => panic!("unexpected {:?}", other),
        }
    }
}
