//! Policy translator.
//!
//! An absent wire policy yields the store default; each present field
//! overrides exactly that field. Embedded read policies are decoded once
//! into the composite's `base`.

use std::time::Duration;

use kvproxy_client::protocol as wire;

use super::expression::compile_expression;
use crate::error::ProxyResult;
use crate::store::policy::{
    BatchDeletePolicy, BatchReadPolicy, BatchUdfPolicy, BatchWritePolicy, CommitLevel,
    GenerationPolicy, MultiPolicy, QueryDuration, ReadModeAp, ReadModeSc, RecordExistsAction,
    ReplicaPolicy,
};
use crate::store::{
    AdminPolicy, BasePolicy, BatchPolicy, FilterExpression, InfoPolicy, QueryPolicy, ScanPolicy,
    WritePolicy,
};

pub fn decode_read_policy(policy: Option<wire::ReadPolicy>) -> ProxyResult<BasePolicy> {
    apply_read(BasePolicy::default(), policy)
}

fn apply_read(mut base: BasePolicy, policy: Option<wire::ReadPolicy>) -> ProxyResult<BasePolicy> {
    let Some(p) = policy else {
        return Ok(base);
    };

    if let Some(exp) = p.filter_expression {
        base.filter_expression = Some(compile_expression(exp)?);
    }
    if let Some(v) = p.read_mode_ap {
        base.read_mode_ap = v.into();
    }
    if let Some(v) = p.read_mode_sc {
        base.read_mode_sc = v.into();
    }
    if let Some(ms) = p.total_timeout {
        base.total_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = p.socket_timeout {
        base.socket_timeout = Duration::from_millis(ms);
    }
    if let Some(v) = p.max_retries {
        base.max_retries = v;
    }
    if let Some(ms) = p.sleep_between_retries {
        base.sleep_between_retries = Duration::from_millis(ms);
    }
    if let Some(v) = p.sleep_multiplier {
        base.sleep_multiplier = v;
    }
    if let Some(v) = p.exit_fast_on_exhausted_connection_pool {
        base.exit_fast_on_exhausted_connection_pool = v;
    }
    if let Some(v) = p.send_key {
        base.send_key = v;
    }
    if let Some(v) = p.use_compression {
        base.use_compression = v;
    }
    if let Some(v) = p.replica_policy {
        base.replica_policy = v.into();
    }
    Ok(base)
}

pub fn decode_write_policy(policy: Option<wire::WritePolicy>) -> ProxyResult<WritePolicy> {
    let Some(p) = policy else {
        return Ok(WritePolicy::default());
    };
    let d = WritePolicy::default();

    Ok(WritePolicy {
        base: apply_read(d.base, p.policy)?,
        record_exists_action: p
            .record_exists_action
            .map_or(d.record_exists_action, Into::into),
        generation_policy: p.generation_policy.map_or(d.generation_policy, Into::into),
        commit_level: p.commit_level.map_or(d.commit_level, Into::into),
        generation: p.generation.unwrap_or(d.generation),
        expiration: p.expiration.unwrap_or(d.expiration),
        respond_per_each_op: p.respond_per_each_op.unwrap_or(d.respond_per_each_op),
        durable_delete: p.durable_delete.unwrap_or(d.durable_delete),
    })
}

fn decode_multi_policy(policy: Option<wire::MultiPolicy>) -> ProxyResult<MultiPolicy> {
    let Some(p) = policy else {
        return Ok(MultiPolicy::default());
    };
    let d = MultiPolicy::default();

    Ok(MultiPolicy {
        base: apply_read(d.base, p.read_policy)?,
        max_concurrent_nodes: p.max_concurrent_nodes.unwrap_or(d.max_concurrent_nodes),
        max_records: p.max_records.unwrap_or(d.max_records),
        records_per_second: p.records_per_second.unwrap_or(d.records_per_second),
        record_queue_size: p.record_queue_size.unwrap_or(d.record_queue_size),
        include_bin_data: p.include_bin_data.unwrap_or(d.include_bin_data),
    })
}

pub fn decode_scan_policy(policy: Option<wire::ScanPolicy>) -> ProxyResult<ScanPolicy> {
    Ok(ScanPolicy {
        multi: decode_multi_policy(policy.and_then(|p| p.multi_policy))?,
    })
}

pub fn decode_query_policy(policy: Option<wire::QueryPolicy>) -> ProxyResult<QueryPolicy> {
    let Some(p) = policy else {
        return Ok(QueryPolicy::default());
    };
    Ok(QueryPolicy {
        multi: decode_multi_policy(p.multi_policy)?,
        expected_duration: p.expected_duration.map_or(QueryDuration::default(), Into::into),
    })
}

pub fn decode_admin_policy(policy: Option<wire::AdminPolicy>) -> AdminPolicy {
    match policy.and_then(|p| p.timeout) {
        Some(ms) => AdminPolicy {
            timeout: Duration::from_millis(u64::from(ms)),
        },
        None => AdminPolicy::default(),
    }
}

pub fn decode_info_policy(policy: Option<wire::InfoPolicy>) -> InfoPolicy {
    match policy.and_then(|p| p.timeout) {
        Some(ms) => InfoPolicy {
            timeout: Duration::from_millis(u64::from(ms)),
        },
        None => InfoPolicy::default(),
    }
}

pub fn decode_batch_policy(policy: Option<wire::BatchPolicy>) -> ProxyResult<BatchPolicy> {
    let Some(p) = policy else {
        return Ok(BatchPolicy::default());
    };
    let d = BatchPolicy::default();

    Ok(BatchPolicy {
        base: apply_read(d.base, p.policy)?,
        concurrent_nodes: p.concurrent_nodes.unwrap_or(d.concurrent_nodes),
        allow_inline: p.allow_inline.unwrap_or(d.allow_inline),
        allow_inline_ssd: p.allow_inline_ssd.unwrap_or(d.allow_inline_ssd),
        respond_all_keys: p.respond_all_keys.unwrap_or(d.respond_all_keys),
        allow_partial_results: p.allow_partial_results.unwrap_or(d.allow_partial_results),
    })
}

pub fn decode_batch_read_policy(
    policy: Option<wire::BatchReadPolicy>,
) -> ProxyResult<BatchReadPolicy> {
    let Some(p) = policy else {
        return Ok(BatchReadPolicy::default());
    };
    Ok(BatchReadPolicy {
        filter_expression: compile_optional(p.filter_expression)?,
        read_mode_ap: p.read_mode_ap.map_or(ReadModeAp::default(), Into::into),
        read_mode_sc: p.read_mode_sc.map_or(ReadModeSc::default(), Into::into),
    })
}

pub fn decode_batch_write_policy(
    policy: Option<wire::BatchWritePolicy>,
) -> ProxyResult<BatchWritePolicy> {
    let Some(p) = policy else {
        return Ok(BatchWritePolicy::default());
    };
    Ok(BatchWritePolicy {
        filter_expression: compile_optional(p.filter_expression)?,
        record_exists_action: p.record_exists_action.map_or_else(Default::default, Into::into),
        commit_level: p.commit_level.map_or_else(Default::default, Into::into),
        generation_policy: p.generation_policy.map_or_else(Default::default, Into::into),
        generation: p.generation.unwrap_or_default(),
        expiration: p.expiration.unwrap_or_default(),
        durable_delete: p.durable_delete.unwrap_or_default(),
        send_key: p.send_key.unwrap_or_default(),
    })
}

pub fn decode_batch_delete_policy(
    policy: Option<wire::BatchDeletePolicy>,
) -> ProxyResult<BatchDeletePolicy> {
    let Some(p) = policy else {
        return Ok(BatchDeletePolicy::default());
    };
    Ok(BatchDeletePolicy {
        filter_expression: compile_optional(p.filter_expression)?,
        commit_level: p.commit_level.map_or_else(Default::default, Into::into),
        generation_policy: p.generation_policy.map_or_else(Default::default, Into::into),
        generation: p.generation.unwrap_or_default(),
        durable_delete: p.durable_delete.unwrap_or_default(),
        send_key: p.send_key.unwrap_or_default(),
    })
}

pub fn decode_batch_udf_policy(
    policy: Option<wire::BatchUdfPolicy>,
) -> ProxyResult<BatchUdfPolicy> {
    let Some(p) = policy else {
        return Ok(BatchUdfPolicy::default());
    };
    Ok(BatchUdfPolicy {
        filter_expression: compile_optional(p.filter_expression)?,
        commit_level: p.commit_level.map_or_else(Default::default, Into::into),
        expiration: p.expiration.unwrap_or_default(),
        durable_delete: p.durable_delete.unwrap_or_default(),
        send_key: p.send_key.unwrap_or_default(),
    })
}

fn compile_optional(exp: Option<wire::Expression>) -> ProxyResult<Option<FilterExpression>> {
    exp.map(compile_expression).transpose()
}

// ==================== Enum mappings ====================

impl From<wire::ReadModeAp> for ReadModeAp {
    fn from(v: wire::ReadModeAp) -> Self {
        match v {
            wire::ReadModeAp::One => ReadModeAp::One,
            wire::ReadModeAp::All => ReadModeAp::All,
        }
    }
}

impl From<wire::ReadModeSc> for ReadModeSc {
    fn from(v: wire::ReadModeSc) -> Self {
        match v {
            wire::ReadModeSc::Session => ReadModeSc::Session,
            wire::ReadModeSc::Linearize => ReadModeSc::Linearize,
            wire::ReadModeSc::AllowReplica => ReadModeSc::AllowReplica,
            wire::ReadModeSc::AllowUnavailable => ReadModeSc::AllowUnavailable,
        }
    }
}

impl From<wire::ReplicaPolicy> for ReplicaPolicy {
    fn from(v: wire::ReplicaPolicy) -> Self {
        match v {
            wire::ReplicaPolicy::Master => ReplicaPolicy::Master,
            wire::ReplicaPolicy::MasterProles => ReplicaPolicy::MasterProles,
            wire::ReplicaPolicy::Sequence => ReplicaPolicy::Sequence,
            wire::ReplicaPolicy::PreferRack => ReplicaPolicy::PreferRack,
            wire::ReplicaPolicy::Random => ReplicaPolicy::Random,
        }
    }
}

impl From<wire::RecordExistsAction> for RecordExistsAction {
    fn from(v: wire::RecordExistsAction) -> Self {
        match v {
            wire::RecordExistsAction::Update => RecordExistsAction::Update,
            wire::RecordExistsAction::UpdateOnly => RecordExistsAction::UpdateOnly,
            wire::RecordExistsAction::Replace => RecordExistsAction::Replace,
            wire::RecordExistsAction::ReplaceOnly => RecordExistsAction::ReplaceOnly,
            wire::RecordExistsAction::CreateOnly => RecordExistsAction::CreateOnly,
        }
    }
}

impl From<wire::GenerationPolicy> for GenerationPolicy {
    fn from(v: wire::GenerationPolicy) -> Self {
        match v {
            wire::GenerationPolicy::None => GenerationPolicy::None,
            wire::GenerationPolicy::ExpectGenEqual => GenerationPolicy::ExpectGenEqual,
            wire::GenerationPolicy::ExpectGenGt => GenerationPolicy::ExpectGenGt,
        }
    }
}

impl From<wire::CommitLevel> for CommitLevel {
    fn from(v: wire::CommitLevel) -> Self {
        match v {
            wire::CommitLevel::CommitAll => CommitLevel::CommitAll,
            wire::CommitLevel::CommitMaster => CommitLevel::CommitMaster,
        }
    }
}

impl From<wire::QueryDuration> for QueryDuration {
    fn from(v: wire::QueryDuration) -> Self {
        match v {
            wire::QueryDuration::Long => QueryDuration::Long,
            wire::QueryDuration::Short => QueryDuration::Short,
            wire::QueryDuration::LongRelaxAp => QueryDuration::LongRelaxAp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvproxy_client::protocol::{ExpOp, Expression};

    #[test]
    fn test_absent_policy_is_default() {
        assert_eq!(decode_read_policy(None).unwrap(), BasePolicy::default());
        assert_eq!(decode_write_policy(None).unwrap(), WritePolicy::default());
        assert_eq!(decode_batch_policy(None).unwrap(), BatchPolicy::default());
        assert_eq!(decode_scan_policy(None).unwrap(), ScanPolicy::default());
        assert_eq!(decode_admin_policy(None), AdminPolicy::default());
    }

    #[test]
    fn test_empty_policy_is_default() {
        let decoded = decode_read_policy(Some(wire::ReadPolicy::default())).unwrap();
        assert_eq!(decoded, BasePolicy::default());
        assert_eq!(decoded.total_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_explicit_zero_differs_from_default() {
        let zero = wire::ReadPolicy {
            total_timeout: Some(0),
            socket_timeout: Some(0),
            max_retries: Some(0),
            sleep_between_retries: Some(0),
            sleep_multiplier: Some(0.0),
            ..Default::default()
        };
        let decoded = decode_read_policy(Some(zero)).unwrap();
        assert_eq!(decoded.total_timeout, Duration::ZERO);
        assert_eq!(decoded.max_retries, 0);
        assert_ne!(decoded, BasePolicy::default());
    }

    #[test]
    fn test_write_policy_fields() {
        let decoded = decode_write_policy(Some(wire::WritePolicy {
            policy: Some(wire::ReadPolicy {
                send_key: Some(true),
                ..Default::default()
            }),
            record_exists_action: Some(wire::RecordExistsAction::CreateOnly),
            expiration: Some(60),
            ..Default::default()
        }))
        .unwrap();
        assert!(decoded.base.send_key);
        assert_eq!(decoded.record_exists_action, RecordExistsAction::CreateOnly);
        assert_eq!(decoded.expiration, 60);
        assert_eq!(decoded.generation_policy, GenerationPolicy::None);
    }

    #[test]
    fn test_multi_policy_keeps_multi_defaults() {
        let decoded = decode_scan_policy(Some(wire::ScanPolicy {
            multi_policy: Some(wire::MultiPolicy {
                max_records: Some(10),
                ..Default::default()
            }),
        }))
        .unwrap();
        assert_eq!(decoded.multi.max_records, 10);
        assert_eq!(decoded.multi.base.total_timeout, Duration::ZERO);
        assert_eq!(decoded.multi.base.max_retries, 5);
        assert!(decoded.multi.include_bin_data);
    }

    #[test]
    fn test_filter_expression_compiled() {
        let decoded = decode_read_policy(Some(wire::ReadPolicy {
            filter_expression: Some(Expression::op(
                ExpOp::And,
                vec![Expression::literal(true)],
            )),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(
            decoded.filter_expression,
            Some(FilterExpression::And(vec![FilterExpression::Bool(true)]))
        );

        let bad = decode_read_policy(Some(wire::ReadPolicy {
            filter_expression: Some(Expression::op(ExpOp::Not, vec![])),
            ..Default::default()
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_admin_timeout() {
        let decoded = decode_admin_policy(Some(wire::AdminPolicy { timeout: Some(250) }));
        assert_eq!(decoded.timeout, Duration::from_millis(250));
    }
}
