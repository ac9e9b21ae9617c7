//! User, role and UDF management over the driver socket

mod common;

use common::TestDaemon;
use kvproxy_client::protocol::{Privilege, UdfLanguage};
use kvproxy_client::{Key, Value};

fn privilege(name: &str, namespace: &str) -> Privilege {
    Privilege {
        name: name.to_string(),
        namespace: namespace.to_string(),
        set_name: String::new(),
    }
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_lifecycle() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    assert!(client
        .create_user("bob", "s3cret", &["read"])
        .await
        .unwrap()
        .is_none());

    let error = client.create_user("bob", "other", &[]).await.unwrap();
    assert_eq!(error.unwrap().result_code, 61);

    assert!(client
        .grant_roles("bob", &["read-write", "read"])
        .await
        .unwrap()
        .is_none());

    let (users, error) = client.query_users(Some("bob")).await.unwrap();
    assert!(error.is_none());
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user, "bob");
    assert_eq!(users[0].roles, vec!["read".to_string(), "read-write".to_string()]);

    assert!(client.drop_user("bob").await.unwrap().is_none());
    let (users, error) = client.query_users(Some("bob")).await.unwrap();
    assert!(users.is_empty());
    assert_eq!(error.unwrap().result_code, 60);
}

#[tokio::test]
async fn test_user_with_unknown_role_rejected() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    let error = client
        .create_user("carol", "pw", &["no-such-role"])
        .await
        .unwrap();
    assert_eq!(error.unwrap().result_code, 70);

    let (users, _) = client.query_users(None).await.unwrap();
    assert!(users.iter().all(|u| u.user != "carol"));
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_role_lifecycle() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    let error = client
        .create_role("analyst", vec![privilege("read", "test")])
        .await
        .unwrap();
    assert!(error.is_none());

    let error = client
        .create_role("analyst", vec![privilege("read", "test")])
        .await
        .unwrap();
    assert_eq!(error.unwrap().result_code, 71);

    let (roles, error) = client.query_roles(Some("analyst")).await.unwrap();
    assert!(error.is_none());
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].privileges, vec![privilege("read", "test")]);

    // Predefined roles are listed alongside custom ones
    let (all, _) = client.query_roles(None).await.unwrap();
    assert!(all.iter().any(|r| r.name == "analyst"));
    assert!(all.iter().any(|r| r.name == "sys-admin"));

    assert!(client
        .create_user("dave", "pw", &["analyst"])
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_role_with_unknown_privilege_is_protocol_error() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    let err = client
        .create_role("broken", vec![privilege("fly", "")])
        .await
        .unwrap_err();
    assert!(matches!(err, kvproxy_client::DriverError::ProtocolError(_)));

    let (roles, error) = client.query_roles(Some("broken")).await.unwrap();
    assert!(roles.is_empty());
    assert_eq!(error.unwrap().result_code, 70);
}

// ============================================================================
// UDF
// ============================================================================

#[tokio::test]
async fn test_udf_register_list_drop() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;

    let body = b"function hello(rec) return 'hi' end";
    assert!(client.register_udf(body, "greet.lua").await.unwrap().is_none());

    let (udfs, error) = client.list_udf().await.unwrap();
    assert!(error.is_none());
    assert_eq!(udfs.len(), 1);
    assert_eq!(udfs[0].package_name, "greet.lua");
    assert_eq!(udfs[0].language, UdfLanguage::Lua);
    assert_eq!(udfs[0].hash.len(), 64);

    assert!(client.drop_udf("greet.lua").await.unwrap().is_none());
    let (udfs, _) = client.list_udf().await.unwrap();
    assert!(udfs.is_empty());

    let error = client.drop_udf("greet.lua").await.unwrap();
    assert_eq!(error.unwrap().result_code, 100);
}

#[tokio::test]
async fn test_udf_execute_results() {
    let daemon = TestDaemon::start().await;
    let mut client = daemon.client().await;
    let key = Key::new("test", "s", "udf");

    let (result, error) = client
        .udf_execute(key.clone(), "missing", "hello", vec![Value::Int(1)])
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(error.unwrap().result_code, 100);

    client.register_udf(b"-- body", "present").await.unwrap();
    let (result, error) = client
        .udf_execute(key, "present", "hello", Vec::new())
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(error.unwrap().result_code, 16);
}
