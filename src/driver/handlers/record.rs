use super::DriverHandler;
use crate::codec::{
    decode_bins, decode_key, decode_operations, decode_read_policy, decode_write_policy, response,
};
use crate::error::ProxyResult;

use kvproxy_client::protocol::{Bin, Key, Operation, ReadPolicy, Response, WritePolicy};

/// Bin-level write commands sharing one request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Put,
    Add,
    Append,
    Prepend,
}

pub async fn handle_get(
    handler: &DriverHandler,
    policy: Option<ReadPolicy>,
    key: Key,
    bin_names: Vec<String>,
) -> ProxyResult<Response> {
    let policy = decode_read_policy(policy)?;
    let key = decode_key(key)?;
    Ok(response::single(
        handler.store.get(&policy, &key, &bin_names).await,
    ))
}

pub async fn handle_get_header(
    handler: &DriverHandler,
    policy: Option<ReadPolicy>,
    key: Key,
) -> ProxyResult<Response> {
    let policy = decode_read_policy(policy)?;
    let key = decode_key(key)?;
    Ok(response::single(handler.store.get_header(&policy, &key).await))
}

pub async fn handle_exists(
    handler: &DriverHandler,
    policy: Option<ReadPolicy>,
    key: Key,
) -> ProxyResult<Response> {
    let policy = decode_read_policy(policy)?;
    let key = decode_key(key)?;
    Ok(response::exists(handler.store.exists(&policy, &key).await))
}

pub async fn handle_write(
    handler: &DriverHandler,
    kind: WriteKind,
    policy: Option<WritePolicy>,
    key: Key,
    bins: Vec<Bin>,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    let key = decode_key(key)?;
    let bins = decode_bins(bins)?;

    let store = &handler.store;
    let result = match kind {
        WriteKind::Put => store.put(&policy, &key, bins).await,
        WriteKind::Add => store.add(&policy, &key, bins).await,
        WriteKind::Append => store.append(&policy, &key, bins).await,
        WriteKind::Prepend => store.prepend(&policy, &key, bins).await,
    };
    Ok(response::status(result))
}

pub async fn handle_delete(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    key: Key,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    let key = decode_key(key)?;
    Ok(response::delete(handler.store.delete(&policy, &key).await))
}

pub async fn handle_touch(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    key: Key,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    let key = decode_key(key)?;
    Ok(response::status(handler.store.touch(&policy, &key).await))
}

pub async fn handle_operate(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    key: Key,
    operations: Vec<Operation>,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    let key = decode_key(key)?;
    let operations = decode_operations(operations)?;
    Ok(response::single(
        handler.store.operate(&policy, &key, operations).await,
    ))
}
