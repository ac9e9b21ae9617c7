use super::admin::{IndexCollectionType, IndexType, Privilege, UdfLanguage};
use super::batch::BatchOperate;
use super::operation::Operation;
use super::policy::{
    AdminPolicy, BatchPolicy, InfoPolicy, QueryPolicy, ReadPolicy, ScanPolicy, WritePolicy,
};
use super::query::{PartitionFilter, Statement};
use super::types::{Bin, Key, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Version,

    // ==================== Single Record ====================
    Get {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<ReadPolicy>,
        key: Key,
        #[serde(default)]
        bin_names: Vec<String>,
    },
    GetHeader {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<ReadPolicy>,
        key: Key,
    },
    Exists {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<ReadPolicy>,
        key: Key,
    },
    Put {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        #[serde(default)]
        bins: Vec<Bin>,
    },
    Add {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        #[serde(default)]
        bins: Vec<Bin>,
    },
    Append {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        #[serde(default)]
        bins: Vec<Bin>,
    },
    Prepend {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        #[serde(default)]
        bins: Vec<Bin>,
    },
    Delete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
    },
    Touch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
    },
    Operate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        #[serde(default)]
        operations: Vec<Operation>,
    },

    // ==================== Batch ====================
    BatchOperate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<BatchPolicy>,
        #[serde(default)]
        records: Vec<BatchOperate>,
    },

    // ==================== Indexes & Truncate ====================
    CreateIndex {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        namespace: String,
        #[serde(default)]
        set_name: String,
        index_name: String,
        bin_name: String,
        index_type: IndexType,
        #[serde(default)]
        index_collection_type: IndexCollectionType,
    },
    DropIndex {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        namespace: String,
        #[serde(default)]
        set_name: String,
        index_name: String,
    },
    Truncate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<InfoPolicy>,
        namespace: String,
        #[serde(default)]
        set_name: String,
        /// Unix nanoseconds; records last updated before this are removed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before_nanos: Option<i64>,
    },

    // ==================== UDF ====================
    RegisterUdf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        #[serde(with = "serde_bytes")]
        udf_body: Vec<u8>,
        package_name: String,
        language: UdfLanguage,
    },
    DropUdf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        package_name: String,
    },
    ListUdf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<ReadPolicy>,
    },
    UdfExecute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<WritePolicy>,
        key: Key,
        package_name: String,
        function_name: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    // ==================== Users & Roles ====================
    CreateUser {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        user: String,
        password: String,
        #[serde(default)]
        roles: Vec<String>,
    },
    DropUser {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        user: String,
    },
    ChangePassword {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        user: String,
        password: String,
    },
    GrantRoles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        user: String,
        roles: Vec<String>,
    },
    RevokeRoles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        user: String,
        roles: Vec<String>,
    },
    QueryUsers {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    QueryRoles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role_name: Option<String>,
    },
    CreateRole {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
        #[serde(default)]
        privileges: Vec<Privilege>,
        #[serde(default)]
        allowlist: Vec<String>,
        #[serde(default)]
        read_quota: u32,
        #[serde(default)]
        write_quota: u32,
    },
    DropRole {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
    },
    GrantPrivileges {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
        privileges: Vec<Privilege>,
    },
    RevokePrivileges {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
        privileges: Vec<Privilege>,
    },
    SetAllowlist {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
        #[serde(default)]
        allowlist: Vec<String>,
    },
    SetQuotas {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<AdminPolicy>,
        role_name: String,
        read_quota: u32,
        write_quota: u32,
    },

    // ==================== Streaming ====================
    Scan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<ScanPolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partition_filter: Option<PartitionFilter>,
        namespace: String,
        #[serde(default)]
        set_name: String,
        #[serde(default)]
        bin_names: Vec<String>,
    },
    Query {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<QueryPolicy>,
        statement: Statement,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partition_filter: Option<PartitionFilter>,
    },
}

impl Command {
    /// Streaming commands answer with a sequence of frames ending in
    /// `Response::StreamEnd`.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Command::Scan { .. } | Command::Query { .. })
    }

    /// Wire tag of the command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::Get { .. } => "get",
            Command::GetHeader { .. } => "get_header",
            Command::Exists { .. } => "exists",
            Command::Put { .. } => "put",
            Command::Add { .. } => "add",
            Command::Append { .. } => "append",
            Command::Prepend { .. } => "prepend",
            Command::Delete { .. } => "delete",
            Command::Touch { .. } => "touch",
            Command::Operate { .. } => "operate",
            Command::BatchOperate { .. } => "batch_operate",
            Command::CreateIndex { .. } => "create_index",
            Command::DropIndex { .. } => "drop_index",
            Command::Truncate { .. } => "truncate",
            Command::RegisterUdf { .. } => "register_udf",
            Command::DropUdf { .. } => "drop_udf",
            Command::ListUdf { .. } => "list_udf",
            Command::UdfExecute { .. } => "udf_execute",
            Command::CreateUser { .. } => "create_user",
            Command::DropUser { .. } => "drop_user",
            Command::ChangePassword { .. } => "change_password",
            Command::GrantRoles { .. } => "grant_roles",
            Command::RevokeRoles { .. } => "revoke_roles",
            Command::QueryUsers { .. } => "query_users",
            Command::QueryRoles { .. } => "query_roles",
            Command::CreateRole { .. } => "create_role",
            Command::DropRole { .. } => "drop_role",
            Command::GrantPrivileges { .. } => "grant_privileges",
            Command::RevokePrivileges { .. } => "revoke_privileges",
            Command::SetAllowlist { .. } => "set_allowlist",
            Command::SetQuotas { .. } => "set_quotas",
            Command::Scan { .. } => "scan",
            Command::Query { .. } => "query",
        }
    }
}
