//! Statement and partition filter decoding for scans and queries.

use kvproxy_client::protocol as wire;

use super::admin::decode_collection_type;
use super::key::decode_digest;
use super::operation::decode_ctx;
use super::value::decode_optional;
use crate::error::{ProxyError, ProxyResult};
use crate::store::query::PARTITIONS;
use crate::store::{Filter, PartitionFilter, PartitionStatus, Statement};

pub fn decode_statement(statement: wire::Statement) -> ProxyResult<Statement> {
    Ok(Statement {
        namespace: statement.namespace,
        set_name: statement.set_name,
        index_name: statement.index_name,
        bin_names: statement.bin_names,
        filter: statement.filter.map(decode_filter).transpose()?,
        task_id: statement.task_id,
        return_data: statement.return_data,
    })
}

/// Absent bounds decode to `Nil`.
pub fn decode_filter(filter: wire::QueryFilter) -> ProxyResult<Filter> {
    Ok(Filter {
        bin_name: filter.name,
        collection_type: decode_collection_type(filter.idx_type),
        value_particle_type: filter.value_particle_type,
        begin: decode_optional(filter.begin)?,
        end: decode_optional(filter.end)?,
        ctx: decode_ctx(filter.ctx)?,
    })
}

/// An absent filter covers every partition.
pub fn decode_partition_filter(
    filter: Option<wire::PartitionFilter>,
) -> ProxyResult<PartitionFilter> {
    let Some(filter) = filter else {
        return Ok(PartitionFilter::all());
    };

    if filter.begin >= PARTITIONS {
        return Err(ProxyError::validation(format!(
            "partition begin {} is outside 0..{}",
            filter.begin, PARTITIONS
        )));
    }
    if u64::from(filter.begin) + u64::from(filter.count) > u64::from(PARTITIONS) {
        return Err(ProxyError::validation(format!(
            "partition range {}+{} exceeds {} partitions",
            filter.begin, filter.count, PARTITIONS
        )));
    }

    Ok(PartitionFilter {
        begin: filter.begin,
        count: filter.count,
        digest: optional_digest(&filter.digest)?,
        partitions: filter
            .partitions
            .into_iter()
            .map(decode_partition_status)
            .collect::<ProxyResult<_>>()?,
        done: filter.done,
        retry: filter.retry,
    })
}

fn decode_partition_status(status: wire::PartitionStatus) -> ProxyResult<PartitionStatus> {
    if status.id >= PARTITIONS {
        return Err(ProxyError::validation(format!(
            "partition id {} is outside 0..{}",
            status.id, PARTITIONS
        )));
    }
    Ok(PartitionStatus {
        bval: status.bval.unwrap_or(0),
        id: status.id,
        retry: status.retry,
        digest: optional_digest(&status.digest)?,
    })
}

fn optional_digest(digest: &[u8]) -> ProxyResult<Option<[u8; crate::store::DIGEST_SIZE]>> {
    if digest.is_empty() {
        Ok(None)
    } else {
        decode_digest(digest).map(Some)
    }
}
