use super::DriverHandler;
use crate::codec::{
    decode_key, decode_read_policy, decode_udf_language, decode_values, decode_write_policy,
    response,
};
use crate::error::ProxyResult;

use kvproxy_client::protocol::{Key, ReadPolicy, Response, UdfLanguage, Value, WritePolicy};

pub async fn handle_register_udf(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    udf_body: Vec<u8>,
    package_name: String,
    language: UdfLanguage,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    tracing::info!("Registering UDF package {} ({} bytes)", package_name, udf_body.len());
    let result = handler
        .store
        .register_udf(&policy, udf_body, &package_name, decode_udf_language(language))
        .await;
    Ok(response::status(result))
}

pub async fn handle_drop_udf(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    package_name: String,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    tracing::info!("Dropping UDF package {}", package_name);
    Ok(response::status(
        handler.store.drop_udf(&policy, &package_name).await,
    ))
}

pub async fn handle_list_udf(
    handler: &DriverHandler,
    policy: Option<ReadPolicy>,
) -> ProxyResult<Response> {
    let policy = decode_read_policy(policy)?;
    Ok(response::udf_list(handler.store.list_udf(&policy).await))
}

pub async fn handle_udf_execute(
    handler: &DriverHandler,
    policy: Option<WritePolicy>,
    key: Key,
    package_name: String,
    function_name: String,
    args: Vec<Value>,
) -> ProxyResult<Response> {
    let policy = decode_write_policy(policy)?;
    let key = decode_key(key)?;
    let args = decode_values(args)?;
    let result = handler
        .store
        .execute_udf(&policy, &key, &package_name, &function_name, args)
        .await;
    Ok(response::udf_result(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_then_list() {
        let handler = DriverHandler::new(Arc::new(MemoryStore::new()), "test");
        let registered = handle_register_udf(
            &handler,
            None,
            b"function f(rec) return 1 end".to_vec(),
            "pkg.lua".to_string(),
            UdfLanguage::Lua,
        )
        .await
        .unwrap();
        assert_eq!(registered, Response::Status { error: None });

        match handle_list_udf(&handler, None).await.unwrap() {
            Response::UdfList { udfs, error } => {
                assert!(error.is_none());
                assert_eq!(udfs.len(), 1);
                assert_eq!(udfs[0].package_name, "pkg.lua");
                assert!(!udfs[0].hash.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_unregistered_reports_store_error() {
        let handler = DriverHandler::new(Arc::new(MemoryStore::new()), "test");
        let response = handle_udf_execute(
            &handler,
            None,
            Key::new("test", "s", 1i64),
            "missing".to_string(),
            "f".to_string(),
            vec![Value::Int(1)],
        )
        .await
        .unwrap();
        match response {
            Response::UdfResult { result, error } => {
                assert!(result.is_none());
                assert_eq!(error.unwrap().result_code, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
