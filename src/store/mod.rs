//! Driver-facing model and the store client boundary.
//!
//! Everything the codec decodes lands in the types of this module, and
//! everything a store hands back is expressed in them before encoding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod admin;
pub mod batch;
pub mod error;
pub mod expression;
pub mod key;
pub mod memory;
pub mod operation;
pub mod policy;
pub mod query;
pub mod record;
pub mod value;

pub use admin::{
    CollectionType, IndexType, Privilege, PrivilegeCode, Role, UdfLanguage, UdfMeta, UserRoles,
};
pub use batch::{BatchItem, BatchRecord, BatchResults, ReadSelection};
pub use error::{result_code, StoreError, StoreResult};
pub use expression::FilterExpression;
pub use key::{Key, DIGEST_SIZE};
pub use memory::MemoryStore;
pub use operation::{CdtContext, Operation};
pub use policy::{
    AdminPolicy, BasePolicy, BatchPolicy, InfoPolicy, QueryPolicy, ScanPolicy, WritePolicy,
};
pub use query::{
    Filter, PartitionFilter, PartitionStatus, RecordCursor, RecordResult, Recordset, Statement,
};
pub use record::{Bin, BinMap, Record};
pub use value::{Value, ValueMap};

/// Calls the daemon issues against a cluster.
///
/// Implementations own connection handling, retries and timeouts; they
/// receive fully decoded, typed arguments.
#[async_trait]
pub trait StoreClient: Send + Sync {
    // ==================== Single Record ====================

    /// Reads the named bins, or all bins when `bin_names` is empty.
    async fn get(&self, policy: &BasePolicy, key: &Key, bin_names: &[String])
        -> StoreResult<Record>;

    async fn get_header(&self, policy: &BasePolicy, key: &Key) -> StoreResult<Record>;

    async fn exists(&self, policy: &BasePolicy, key: &Key) -> StoreResult<bool>;

    async fn put(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()>;

    async fn add(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()>;

    async fn append(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()>;

    async fn prepend(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()>;

    /// Returns whether the record existed.
    async fn delete(&self, policy: &WritePolicy, key: &Key) -> StoreResult<bool>;

    async fn touch(&self, policy: &WritePolicy, key: &Key) -> StoreResult<()>;

    async fn operate(
        &self,
        policy: &WritePolicy,
        key: &Key,
        operations: Vec<Operation>,
    ) -> StoreResult<Record>;

    // ==================== Batch ====================

    async fn batch_operate(&self, policy: &BatchPolicy, items: Vec<BatchItem>) -> BatchResults;

    // ==================== Indexes & Truncate ====================

    #[allow(clippy::too_many_arguments)]
    async fn create_index(
        &self,
        policy: &WritePolicy,
        namespace: &str,
        set_name: &str,
        index_name: &str,
        bin_name: &str,
        index_type: IndexType,
        collection_type: CollectionType,
    ) -> StoreResult<()>;

    async fn drop_index(
        &self,
        policy: &WritePolicy,
        namespace: &str,
        set_name: &str,
        index_name: &str,
    ) -> StoreResult<()>;

    /// Removes records last updated before `before`, or all records when
    /// `before` is absent.
    async fn truncate(
        &self,
        policy: &InfoPolicy,
        namespace: &str,
        set_name: &str,
        before: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    // ==================== UDF ====================

    async fn register_udf(
        &self,
        policy: &WritePolicy,
        body: Vec<u8>,
        package_name: &str,
        language: UdfLanguage,
    ) -> StoreResult<()>;

    async fn drop_udf(&self, policy: &WritePolicy, package_name: &str) -> StoreResult<()>;

    async fn list_udf(&self, policy: &BasePolicy) -> StoreResult<Vec<UdfMeta>>;

    async fn execute_udf(
        &self,
        policy: &WritePolicy,
        key: &Key,
        package_name: &str,
        function_name: &str,
        args: Vec<Value>,
    ) -> StoreResult<Option<Value>>;

    // ==================== Users & Roles ====================

    async fn create_user(
        &self,
        policy: &AdminPolicy,
        user: &str,
        password: &str,
        roles: Vec<String>,
    ) -> StoreResult<()>;

    async fn drop_user(&self, policy: &AdminPolicy, user: &str) -> StoreResult<()>;

    async fn change_password(
        &self,
        policy: &AdminPolicy,
        user: &str,
        password: &str,
    ) -> StoreResult<()>;

    async fn grant_roles(
        &self,
        policy: &AdminPolicy,
        user: &str,
        roles: Vec<String>,
    ) -> StoreResult<()>;

    async fn revoke_roles(
        &self,
        policy: &AdminPolicy,
        user: &str,
        roles: Vec<String>,
    ) -> StoreResult<()>;

    /// All users when `user` is absent.
    async fn query_users(
        &self,
        policy: &AdminPolicy,
        user: Option<&str>,
    ) -> StoreResult<Vec<UserRoles>>;

    /// All roles when `role_name` is absent.
    async fn query_roles(
        &self,
        policy: &AdminPolicy,
        role_name: Option<&str>,
    ) -> StoreResult<Vec<Role>>;

    async fn create_role(&self, policy: &AdminPolicy, role: Role) -> StoreResult<()>;

    async fn drop_role(&self, policy: &AdminPolicy, role_name: &str) -> StoreResult<()>;

    async fn grant_privileges(
        &self,
        policy: &AdminPolicy,
        role_name: &str,
        privileges: Vec<Privilege>,
    ) -> StoreResult<()>;

    async fn revoke_privileges(
        &self,
        policy: &AdminPolicy,
        role_name: &str,
        privileges: Vec<Privilege>,
    ) -> StoreResult<()>;

    async fn set_allowlist(
        &self,
        policy: &AdminPolicy,
        role_name: &str,
        allowlist: Vec<String>,
    ) -> StoreResult<()>;

    async fn set_quotas(
        &self,
        policy: &AdminPolicy,
        role_name: &str,
        read_quota: u32,
        write_quota: u32,
    ) -> StoreResult<()>;

    // ==================== Streaming ====================

    async fn scan_partitions(
        &self,
        policy: &ScanPolicy,
        partition_filter: PartitionFilter,
        namespace: &str,
        set_name: &str,
        bin_names: Vec<String>,
    ) -> StoreResult<Recordset>;

    async fn query_partitions(
        &self,
        policy: &QueryPolicy,
        statement: Statement,
        partition_filter: PartitionFilter,
    ) -> StoreResult<Recordset>;
}
