use super::DriverHandler;
use crate::codec::{
    decode_collection_type, decode_index_type, decode_info_policy, decode_truncate_before,
    decode_write_policy, response,
};
use crate::error::ProxyResult;

use kvproxy_client::protocol::{
    IndexCollectionType, IndexType, InfoPolicy, Response, WritePolicy,
};

/// Secondary index definition as received on the wire.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub namespace: String,
    pub set_name: String,
    pub index_name: String,
    pub bin_name: String,
    pub index_type: IndexType,
    pub collection_type: IndexCollectionType,
}

pub async fn handle_create_index(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    spec: IndexSpec,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    tracing::info!(
        "Creating index {} on {}.{}.{}",
        spec.index_name,
        spec.namespace,
        spec.set_name,
        spec.bin_name
    );
    let result = handler
        .store
        .create_index(
            &policy,
            &spec.namespace,
            &spec.set_name,
            &spec.index_name,
            &spec.bin_name,
            decode_index_type(spec.index_type),
            decode_collection_type(spec.collection_type),
        )
        .await;
    Ok(response::status(result))
}

pub async fn handle_drop_index(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    namespace: String,
    set_name: String,
    index_name: String,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    tracing::info!("Dropping index {} on {}", index_name, namespace);
    let result = handler
        .store
        .drop_index(&policy, &namespace, &set_name, &index_name)
        .await;
    Ok(response::status(result))
}

pub async fn handle_truncate(
    handler: &DriverHandler,
    policy: Option<InfoPolicy>,
    namespace: String,
    set_name: String,
    before_nanos: Option<i64>,
) -> ProxyResult<Response> {
    let policy = decode_info_policy(policy);
    let before = decode_truncate_before(before_nanos);
    tracing::info!("Truncating {}.{} before {:?}", namespace, set_name, before);
    let result = handler
        .store
        .truncate(&policy, &namespace, &set_name, before)
        .await;
    Ok(response::status(result))
}
