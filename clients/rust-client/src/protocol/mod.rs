//! Wire protocol definitions shared by the daemon and its clients
//!
//! Uses MessagePack for compact binary serialization.

pub mod admin;
pub mod batch;
pub mod codec;
pub mod command;
pub mod error;
pub mod expression;
pub mod operation;
pub mod policy;
pub mod query;
pub mod response;
pub mod types;

pub use admin::{IndexCollectionType, IndexType, Privilege, Role, UdfLanguage, UdfMeta, UserRole};
pub use batch::BatchOperate;
pub use codec::{
    decode_message, encode_command, encode_message, encode_response, DRIVER_MAGIC, MAX_MESSAGE_SIZE,
};
pub use command::Command;
pub use error::DriverError;
pub use expression::{ExpOp, ExpType, Expression};
pub use operation::{
    BitwiseOp, BitwiseOperation, BitwisePolicy, CdtListPolicy, CdtMapPolicy, HllOp, HllOperation,
    HllPolicy, ListOp, ListOperation, ListOrderType, MapOp, MapOperation, MapOrderType, Operation,
    ReturnType, StdOp, StdOperation,
};
pub use policy::{
    AdminPolicy, BatchDeletePolicy, BatchPolicy, BatchReadPolicy, BatchUdfPolicy,
    BatchWritePolicy, CommitLevel, GenerationPolicy, InfoPolicy, MultiPolicy, QueryDuration,
    QueryPolicy, ReadModeAp, ReadModeSc, ReadPolicy, RecordExistsAction, ReplicaPolicy,
    ScanPolicy, WritePolicy,
};
pub use query::{PartitionFilter, PartitionStatus, QueryFilter, Statement};
pub use response::Response;
pub use types::{
    BatchRecord, Bin, CdtContext, CtxType, ErrorInfo, JsonEntry, Key, MapEntry, Record, Value,
};
