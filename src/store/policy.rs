//! Store policies with their documented defaults.
//!
//! The `Default` impls here are the values used when a request carries no
//! policy (or leaves a field unset). They are never zero-filled.

use std::time::Duration;

use super::expression::FilterExpression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadModeAp {
    #[default]
    One,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadModeSc {
    #[default]
    Session,
    Linearize,
    AllowReplica,
    AllowUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicaPolicy {
    Master,
    MasterProles,
    #[default]
    Sequence,
    PreferRack,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordExistsAction {
    #[default]
    Update,
    UpdateOnly,
    Replace,
    ReplaceOnly,
    CreateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    #[default]
    None,
    ExpectGenEqual,
    ExpectGenGt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitLevel {
    #[default]
    CommitAll,
    CommitMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryDuration {
    #[default]
    Long,
    Short,
    LongRelaxAp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasePolicy {
    pub filter_expression: Option<FilterExpression>,
    pub read_mode_ap: ReadModeAp,
    pub read_mode_sc: ReadModeSc,
    pub total_timeout: Duration,
    pub socket_timeout: Duration,
    pub max_retries: u32,
    pub sleep_between_retries: Duration,
    pub sleep_multiplier: f64,
    pub exit_fast_on_exhausted_connection_pool: bool,
    pub send_key: bool,
    pub use_compression: bool,
    pub replica_policy: ReplicaPolicy,
}

impl Default for BasePolicy {
    fn default() -> Self {
        Self {
            filter_expression: None,
            read_mode_ap: ReadModeAp::default(),
            read_mode_sc: ReadModeSc::default(),
            total_timeout: Duration::from_millis(1000),
            socket_timeout: Duration::from_secs(30),
            max_retries: 2,
            sleep_between_retries: Duration::from_millis(1),
            sleep_multiplier: 1.0,
            exit_fast_on_exhausted_connection_pool: false,
            send_key: false,
            use_compression: false,
            replica_policy: ReplicaPolicy::default(),
        }
    }
}

impl BasePolicy {
    /// Base used by scans and queries: no total timeout and more retries.
    pub fn multi() -> Self {
        Self {
            total_timeout: Duration::ZERO,
            max_retries: 5,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritePolicy {
    pub base: BasePolicy,
    pub record_exists_action: RecordExistsAction,
    pub generation_policy: GenerationPolicy,
    pub commit_level: CommitLevel,
    pub generation: u32,
    /// Relative TTL in seconds. 0 uses the namespace default, `u32::MAX`
    /// never expires, `u32::MAX - 1` leaves the current TTL untouched.
    pub expiration: u32,
    pub respond_per_each_op: bool,
    pub durable_delete: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            base: BasePolicy::default(),
            record_exists_action: RecordExistsAction::default(),
            generation_policy: GenerationPolicy::default(),
            commit_level: CommitLevel::default(),
            generation: 0,
            expiration: 0,
            respond_per_each_op: false,
            durable_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiPolicy {
    pub base: BasePolicy,
    pub max_concurrent_nodes: u32,
    pub max_records: u64,
    pub records_per_second: u32,
    pub record_queue_size: u32,
    pub include_bin_data: bool,
}

impl Default for MultiPolicy {
    fn default() -> Self {
        Self {
            base: BasePolicy::multi(),
            max_concurrent_nodes: 0,
            max_records: 0,
            records_per_second: 0,
            record_queue_size: 50_000,
            include_bin_data: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanPolicy {
    pub multi: MultiPolicy,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPolicy {
    pub multi: MultiPolicy,
    pub expected_duration: QueryDuration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminPolicy {
    pub timeout: Duration,
}

impl Default for AdminPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoPolicy {
    pub timeout: Duration,
}

impl Default for InfoPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchPolicy {
    pub base: BasePolicy,
    pub concurrent_nodes: u32,
    pub allow_inline: bool,
    pub allow_inline_ssd: bool,
    pub respond_all_keys: bool,
    pub allow_partial_results: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            base: BasePolicy::default(),
            concurrent_nodes: 1,
            allow_inline: true,
            allow_inline_ssd: false,
            respond_all_keys: true,
            allow_partial_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReadPolicy {
    pub filter_expression: Option<FilterExpression>,
    pub read_mode_ap: ReadModeAp,
    pub read_mode_sc: ReadModeSc,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchWritePolicy {
    pub filter_expression: Option<FilterExpression>,
    pub record_exists_action: RecordExistsAction,
    pub commit_level: CommitLevel,
    pub generation_policy: GenerationPolicy,
    pub generation: u32,
    pub expiration: u32,
    pub durable_delete: bool,
    pub send_key: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchDeletePolicy {
    pub filter_expression: Option<FilterExpression>,
    pub commit_level: CommitLevel,
    pub generation_policy: GenerationPolicy,
    pub generation: u32,
    pub durable_delete: bool,
    pub send_key: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchUdfPolicy {
    pub filter_expression: Option<FilterExpression>,
    pub commit_level: CommitLevel,
    pub expiration: u32,
    pub durable_delete: bool,
    pub send_key: bool,
}

impl From<&BatchWritePolicy> for WritePolicy {
    fn from(p: &BatchWritePolicy) -> Self {
        WritePolicy {
            base: BasePolicy {
                filter_expression: p.filter_expression.clone(),
                send_key: p.send_key,
                ..BasePolicy::default()
            },
            record_exists_action: p.record_exists_action,
            generation_policy: p.generation_policy,
            commit_level: p.commit_level,
            generation: p.generation,
            expiration: p.expiration,
            durable_delete: p.durable_delete,
            ..WritePolicy::default()
        }
    }
}

impl From<&BatchDeletePolicy> for WritePolicy {
    fn from(p: &BatchDeletePolicy) -> Self {
        WritePolicy {
            base: BasePolicy {
                filter_expression: p.filter_expression.clone(),
                send_key: p.send_key,
                ..BasePolicy::default()
            },
            generation_policy: p.generation_policy,
            commit_level: p.commit_level,
            generation: p.generation,
            durable_delete: p.durable_delete,
            ..WritePolicy::default()
        }
    }
}

impl From<&BatchReadPolicy> for BasePolicy {
    fn from(p: &BatchReadPolicy) -> Self {
        BasePolicy {
            filter_expression: p.filter_expression.clone(),
            read_mode_ap: p.read_mode_ap,
            read_mode_sc: p.read_mode_sc,
            ..BasePolicy::default()
        }
    }
}
