//! Batch, scan and query commands end to end

mod common;

use common::TestDaemon;
use kvproxy_client::protocol::{
    IndexCollectionType, IndexType, ListOp, PartitionFilter, QueryFilter, ScanPolicy, Statement,
};
use kvproxy_client::{BatchOperate, Bin, Key, Operation, Value};

async fn seed(client: &mut kvproxy_client::KvClient, set: &str, count: i64) {
    for i in 0..count {
        let error = client
            .put(
                Key::new("test", set, i),
                vec![Bin::new("n", i), Bin::new("parity", if i % 2 == 0 { "even" } else { "odd" })],
            )
            .await
            .unwrap();
        assert!(error.is_none());
    }
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn test_batch_mixed_items() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "b", 3).await;

    let (records, error) = client
        .batch_operate(
            None,
            vec![
                BatchOperate::read_all(Key::new("test", "b", 0i64)),
                BatchOperate::read_bins(Key::new("test", "b", 1i64), &["n"]),
                BatchOperate::write(
                    Key::new("test", "b", 2i64),
                    vec![Operation::put("n", 20i64)],
                ),
                BatchOperate::delete(Key::new("test", "b", 99i64)),
            ],
        )
        .await
        .unwrap();

    assert!(error.is_none());
    assert_eq!(records.len(), 4);

    let first = records[0].record.as_ref().unwrap();
    assert_eq!(first.bins.len(), 2);

    let second = records[1].record.as_ref().unwrap();
    assert_eq!(second.bins.len(), 1);
    assert_eq!(second.bins.get("n"), Some(&Value::Int(1)));

    assert!(records[2].error.is_none());
    assert_eq!(records[3].error.unwrap().result_code, 2);

    let (record, _) = client.get(Key::new("test", "b", 2i64), &["n"]).await.unwrap();
    assert_eq!(record.unwrap().bins.get("n"), Some(&Value::Int(20)));
}

#[tokio::test]
async fn test_batch_malformed_item_is_isolated() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "b", 2).await;

    let (records, error) = client
        .batch_operate(
            None,
            vec![
                BatchOperate::read_all(Key::new("test", "b", 0i64)),
                BatchOperate::write(
                    Key::new("test", "b", 1i64),
                    vec![Operation::list(ListOp::Insert, "l", vec![Value::Int(0)])],
                ),
                BatchOperate::read_all(Key::new("test", "b", 1i64)),
            ],
        )
        .await
        .unwrap();

    assert!(error.is_none());
    assert_eq!(records.len(), 3);
    assert!(records[0].error.is_none());
    assert_eq!(records[1].error.unwrap().result_code, 4);
    assert_eq!(records[1].key, Some(Key::new("test", "b", 1i64)));
    assert!(records[2].record.is_some());
}

// ============================================================================
// Scan
// ============================================================================

#[tokio::test]
async fn test_scan_whole_set() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "scan", 25).await;
    seed(&mut client, "other", 5).await;

    let output = client.scan(None, None, "test", "scan", &[]).await.unwrap();
    assert!(output.error.is_none());
    assert_eq!(output.entries.len(), 25);
    assert!(output.entries.iter().all(|e| e.error.is_none()));

    let mut seen: Vec<i64> = output
        .records()
        .filter_map(|r| match r.bins.get("n") {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        })
        .collect();
    seen.sort();
    assert_eq!(seen, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_scan_partition_ranges_cover_set() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "parts", 40).await;

    let low = client
        .scan(None, Some(PartitionFilter::range(0, 2048)), "test", "parts", &[])
        .await
        .unwrap();
    let high = client
        .scan(
            None,
            Some(PartitionFilter::range(2048, 2048)),
            "test",
            "parts",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(low.entries.len() + high.entries.len(), 40);
}

#[tokio::test]
async fn test_scan_invalid_partition_range() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    let err = client
        .scan(None, Some(PartitionFilter::range(4000, 500)), "test", "x", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, kvproxy_client::DriverError::ValidationError(_)));

    // Connection still usable after the rejected stream
    let output = client.scan(None, None, "test", "x", &[]).await.unwrap();
    assert!(output.entries.is_empty());
}

#[tokio::test]
async fn test_scan_without_bin_data() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "nobins", 3).await;

    let policy = ScanPolicy {
        multi_policy: Some(kvproxy_client::protocol::MultiPolicy {
            include_bin_data: Some(false),
            ..Default::default()
        }),
    };
    let output = client
        .scan(Some(policy), None, "test", "nobins", &[])
        .await
        .unwrap();
    assert_eq!(output.entries.len(), 3);
    assert!(output.records().all(|r| r.bins.is_empty()));
}

// ============================================================================
// Secondary index query
// ============================================================================

fn range_statement(set: &str, begin: i64, end: i64) -> Statement {
    Statement {
        namespace: "test".to_string(),
        set_name: set.to_string(),
        index_name: None,
        bin_names: Vec::new(),
        filter: Some(QueryFilter {
            name: "n".to_string(),
            idx_type: IndexCollectionType::Default,
            value_particle_type: 1,
            begin: Some(Value::Int(begin)),
            end: Some(Value::Int(end)),
            ctx: Vec::new(),
        }),
        task_id: 1,
        return_data: true,
    }
}

#[tokio::test]
async fn test_query_requires_index() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "q", 10).await;

    let output = client
        .query(None, range_statement("q", 2, 4), None)
        .await
        .unwrap();
    assert!(output.entries.is_empty());
    assert_eq!(output.error.unwrap().result_code, 201);
}

#[tokio::test]
async fn test_query_range_on_index() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "q", 10).await;

    let error = client
        .create_index(
            "test",
            "q",
            "n_idx",
            "n",
            IndexType::Numeric,
            IndexCollectionType::Default,
        )
        .await
        .unwrap();
    assert!(error.is_none());

    let output = client
        .query(None, range_statement("q", 2, 4), None)
        .await
        .unwrap();
    assert!(output.error.is_none());
    let mut found: Vec<i64> = output
        .records()
        .filter_map(|r| match r.bins.get("n") {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        })
        .collect();
    found.sort();
    assert_eq!(found, vec![2, 3, 4]);

    let error = client.drop_index("test", "q", "n_idx").await.unwrap();
    assert!(error.is_none());
    let error = client.drop_index("test", "q", "n_idx").await.unwrap();
    assert_eq!(error.unwrap().result_code, 201);
}

// ============================================================================
// Truncate
// ============================================================================

#[tokio::test]
async fn test_truncate_set() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    seed(&mut client, "gone", 5).await;
    seed(&mut client, "kept", 2).await;

    assert!(client.truncate("test", "gone", None).await.unwrap().is_none());

    let gone = client.scan(None, None, "test", "gone", &[]).await.unwrap();
    assert!(gone.entries.is_empty());
    let kept = client.scan(None, None, "test", "kept", &[]).await.unwrap();
    assert_eq!(kept.entries.len(), 2);
}
