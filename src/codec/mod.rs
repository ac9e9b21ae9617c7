//! Translation between the wire protocol and the store model.
//!
//! Every function here is pure: decoders take owned wire messages and
//! return typed store values or a `ProxyError`, encoders never fail.

pub mod admin;
pub mod batch;
pub mod expression;
pub mod key;
pub mod operation;
pub mod policy;
pub mod query;
pub mod response;
pub mod value;

pub use admin::{
    decode_collection_type, decode_index_type, decode_privileges, decode_truncate_before,
    decode_udf_language,
};
pub use batch::decode_batch_item;
pub use expression::compile_expression;
pub use key::{decode_bins, decode_key, encode_key, encode_record};
pub use operation::{decode_operation, decode_operations};
pub use policy::{
    decode_admin_policy, decode_batch_policy, decode_info_policy, decode_query_policy,
    decode_read_policy, decode_scan_policy, decode_write_policy,
};
pub use query::{decode_partition_filter, decode_statement};
pub use value::{decode_value, decode_values, encode_value};
