//! Wire policies.
//!
//! Every field is optional. An absent field means "use the driver
//! default"; an explicit zero is carried through as zero.

use super::expression::Expression;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadModeAp {
    One,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadModeSc {
    Session,
    Linearize,
    AllowReplica,
    AllowUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaPolicy {
    Master,
    MasterProles,
    Sequence,
    PreferRack,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordExistsAction {
    Update,
    UpdateOnly,
    Replace,
    ReplaceOnly,
    CreateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPolicy {
    None,
    ExpectGenEqual,
    ExpectGenGt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitLevel {
    CommitAll,
    CommitMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryDuration {
    Long,
    Short,
    LongRelaxAp,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_mode_ap: Option<ReadModeAp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_mode_sc: Option<ReadModeSc>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout: Option<u64>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_between_retries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_fast_on_exhausted_connection_pool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_compression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_policy: Option<ReplicaPolicy>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WritePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ReadPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_exists_action: Option<RecordExistsAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_policy: Option<GenerationPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_level: Option<CommitLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respond_per_each_op: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_delete: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_policy: Option<ReadPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_per_second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_queue_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_bin_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_policy: Option<MultiPolicy>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_policy: Option<MultiPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_duration: Option<QueryDuration>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdminPolicy {
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InfoPolicy {
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ReadPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_inline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_inline_ssd: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respond_all_keys: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_partial_results: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReadPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_mode_ap: Option<ReadModeAp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_mode_sc: Option<ReadModeSc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchWritePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_exists_action: Option<RecordExistsAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_level: Option<CommitLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_policy: Option<GenerationPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_key: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchDeletePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_level: Option<CommitLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_policy: Option<GenerationPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_key: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchUdfPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_level: Option<CommitLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_key: Option<bool>,
}
