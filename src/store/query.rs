//! Scan/query inputs and the streamed result set.

use async_trait::async_trait;

use super::admin::CollectionType;
use super::error::StoreError;
use super::key::{Key, DIGEST_SIZE};
use super::operation::CdtContext;
use super::record::Record;
use super::value::Value;

pub const PARTITIONS: u32 = 4096;

/// Secondary index predicate: equality when `begin == end`, range otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub bin_name: String,
    pub collection_type: CollectionType,
    pub value_particle_type: i64,
    pub begin: Value,
    pub end: Value,
    pub ctx: Vec<CdtContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub namespace: String,
    pub set_name: String,
    pub index_name: Option<String>,
    pub bin_names: Vec<String>,
    pub filter: Option<Filter>,
    pub task_id: u64,
    pub return_data: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStatus {
    pub bval: i64,
    pub id: u32,
    pub retry: bool,
    pub digest: Option<[u8; DIGEST_SIZE]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFilter {
    pub begin: u32,
    pub count: u32,
    pub digest: Option<[u8; DIGEST_SIZE]>,
    pub partitions: Vec<PartitionStatus>,
    pub done: bool,
    pub retry: bool,
}

impl PartitionFilter {
    pub fn all() -> Self {
        Self {
            begin: 0,
            count: PARTITIONS,
            digest: None,
            partitions: Vec::new(),
            done: false,
            retry: false,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        let id = key.partition_id();
        id >= self.begin && id - self.begin < self.count
    }
}

/// One streamed item: a record, or the error the store reported in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub record: Option<Record>,
    pub error: Option<StoreError>,
    pub bval: Option<i64>,
}

impl RecordResult {
    pub fn record(record: Record) -> Self {
        Self {
            record: Some(record),
            error: None,
            bval: None,
        }
    }

    pub fn error(error: StoreError) -> Self {
        Self {
            record: None,
            error: Some(error),
            bval: None,
        }
    }
}

/// Source of streamed results behind a `Recordset`.
#[async_trait]
pub trait RecordCursor: Send {
    /// Next result, or `None` once the stream is exhausted.
    async fn next(&mut self) -> Option<RecordResult>;

    /// Releases the underlying resources. Called at most once.
    fn close(&mut self);
}

/// Lazy, finite, non-restartable stream of scan or query results.
///
/// The cursor is released exactly once: on exhaustion, on an explicit
/// `close`, or when the recordset is dropped.
pub struct Recordset {
    cursor: Box<dyn RecordCursor>,
    closed: bool,
}

impl Recordset {
    pub fn new(cursor: Box<dyn RecordCursor>) -> Self {
        Self {
            cursor,
            closed: false,
        }
    }

    pub async fn next(&mut self) -> Option<RecordResult> {
        if self.closed {
            return None;
        }
        let item = self.cursor.next().await;
        if item.is_none() {
            self.close();
        }
        item
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cursor.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Recordset {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cursor over an already materialized result list.
pub struct VecCursor {
    items: std::vec::IntoIter<RecordResult>,
}

impl VecCursor {
    pub fn new(items: Vec<RecordResult>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

#[async_trait]
impl RecordCursor for VecCursor {
    async fn next(&mut self) -> Option<RecordResult> {
        self.items.next()
    }

    fn close(&mut self) {
        self.items = Vec::new().into_iter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCursor {
        remaining: usize,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RecordCursor for CountingCursor {
        async fn next(&mut self) -> Option<RecordResult> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(RecordResult::record(Record {
                key: None,
                generation: 1,
                expiration: 0,
                bins: BTreeMap::new(),
            }))
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(remaining: usize) -> (Recordset, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let rs = Recordset::new(Box::new(CountingCursor {
            remaining,
            closes: closes.clone(),
        }));
        (rs, closes)
    }

    #[tokio::test]
    async fn test_exhaustion_closes_once() {
        let (mut rs, closes) = counting(2);
        assert!(rs.next().await.is_some());
        assert!(rs.next().await.is_some());
        assert!(rs.next().await.is_none());
        assert!(rs.next().await.is_none());
        drop(rs);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_close_then_drop() {
        let (mut rs, closes) = counting(5);
        assert!(rs.next().await.is_some());
        rs.close();
        rs.close();
        assert!(rs.next().await.is_none());
        drop(rs);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_without_iteration_closes() {
        let (rs, closes) = counting(3);
        drop(rs);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_partition_filter_contains() {
        let key = Key::new("test", "s", Value::Int(7)).unwrap();
        assert!(PartitionFilter::all().contains(&key));

        let mut only = PartitionFilter::all();
        only.begin = key.partition_id();
        only.count = 1;
        assert!(only.contains(&key));

        only.begin = (key.partition_id() + 1) % PARTITIONS;
        assert!(!only.contains(&key));
    }
}
