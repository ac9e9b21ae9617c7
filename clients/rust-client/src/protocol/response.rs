use super::admin::{Role, UdfMeta, UserRole};
use super::error::DriverError;
use super::types::{BatchRecord, ErrorInfo, Record, Value};
use serde::{Deserialize, Serialize};

/// Response from the daemon.
///
/// `error` fields carry the store outcome and are absent when the store
/// reported neither a failure nor doubt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Version {
        version: String,
    },

    Single {
        #[serde(default)]
        record: Option<Record>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    Exists {
        exists: bool,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    Delete {
        existed: bool,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    /// Outcome of a call that returns nothing but a status
    Status {
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    Batch {
        #[serde(default)]
        records: Vec<BatchRecord>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    UdfList {
        #[serde(default)]
        udfs: Vec<UdfMeta>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    UdfResult {
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    Users {
        #[serde(default)]
        users: Vec<UserRole>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    Roles {
        #[serde(default)]
        roles: Vec<Role>,
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    /// One record (or per-record store error) of a scan or query
    StreamItem {
        #[serde(default)]
        record: Option<Record>,
        #[serde(default)]
        error: Option<ErrorInfo>,
        #[serde(default)]
        bval: Option<i64>,
    },

    /// Terminates a scan or query stream
    StreamEnd {
        #[serde(default)]
        error: Option<ErrorInfo>,
    },

    /// The request itself could not be served
    Error { error: DriverError },
}

impl Response {
    pub fn status(error: Option<ErrorInfo>) -> Self {
        Response::Status { error }
    }

    pub fn error(err: DriverError) -> Self {
        Response::Error { error: err }
    }

    pub fn version() -> Self {
        Response::Version {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
