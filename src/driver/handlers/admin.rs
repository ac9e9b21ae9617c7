//! User and role administration handlers.

use super::DriverHandler;
use crate::codec::{decode_admin_policy, decode_privileges, response};
use crate::error::ProxyResult;
use crate::store::Role;

use kvproxy_client::protocol::{AdminPolicy, Privilege, Response};

// ==================== Users ====================

pub async fn handle_create_user(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: String,
    password: String,
    roles: Vec<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    tracing::info!("Creating user {}", user);
    Ok(response::status(
        handler
            .store
            .create_user(&policy, &user, &password, roles)
            .await,
    ))
}

pub async fn handle_drop_user(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: String,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    tracing::info!("Dropping user {}", user);
    Ok(response::status(handler.store.drop_user(&policy, &user).await))
}

pub async fn handle_change_password(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: String,
    password: String,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::status(
        handler
            .store
            .change_password(&policy, &user, &password)
            .await,
    ))
}

pub async fn handle_grant_roles(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: String,
    roles: Vec<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::status(
        handler.store.grant_roles(&policy, &user, roles).await,
    ))
}

pub async fn handle_revoke_roles(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: String,
    roles: Vec<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::status(
        handler.store.revoke_roles(&policy, &user, roles).await,
    ))
}

pub async fn handle_query_users(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    user: Option<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::users(
        handler.store.query_users(&policy, user.as_deref()).await,
    ))
}

// ==================== Roles ====================

pub async fn handle_query_roles(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: Option<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::roles(
        handler
            .store
            .query_roles(&policy, role_name.as_deref())
            .await,
    ))
}

/// `quotas` is `(read, write)`.
pub async fn handle_create_role(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
    privileges: Vec<Privilege>,
    allowlist: Vec<String>,
    quotas: (u32, u32),
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    let role = Role {
        name: role_name,
        privileges: decode_privileges(privileges)?,
        allowlist,
        read_quota: quotas.0,
        write_quota: quotas.1,
    };
    tracing::info!("Creating role {}", role.name);
    Ok(response::status(handler.store.create_role(&policy, role).await))
}

pub async fn handle_drop_role(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    tracing::info!("Dropping role {}", role_name);
    Ok(response::status(
        handler.store.drop_role(&policy, &role_name).await,
    ))
}

pub async fn handle_grant_privileges(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
    privileges: Vec<Privilege>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    let privileges = decode_privileges(privileges)?;
    Ok(response::status(
        handler
            .store
            .grant_privileges(&policy, &role_name, privileges)
            .await,
    ))
}

pub async fn handle_revoke_privileges(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
    privileges: Vec<Privilege>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    let privileges = decode_privileges(privileges)?;
    Ok(response::status(
        handler
            .store
            .revoke_privileges(&policy, &role_name, privileges)
            .await,
    ))
}

pub async fn handle_set_allowlist(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
    allowlist: Vec<String>,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::status(
        handler
            .store
            .set_allowlist(&policy, &role_name, allowlist)
            .await,
    ))
}

pub async fn handle_set_quotas(
    handler: &DriverHandler,
    policy: Option<AdminPolicy>,
    role_name: String,
    read_quota: u32,
    write_quota: u32,
) -> ProxyResult<Response> {
    let policy = decode_admin_policy(policy);
    Ok(response::status(
        handler
            .store
            .set_quotas(&policy, &role_name, read_quota, write_quota)
            .await,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn handler() -> DriverHandler {
        DriverHandler::new(Arc::new(MemoryStore::new()), "test")
    }

    fn privilege(name: &str) -> Privilege {
        Privilege {
            name: name.to_string(),
            namespace: "test".to_string(),
            set_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_role_lifecycle() {
        let handler = handler();
        let created = handle_create_role(
            &handler,
            None,
            "ops".to_string(),
            vec![privilege("read")],
            vec!["10.0.0.0/8".to_string()],
            (5, 0),
        )
        .await
        .unwrap();
        assert_eq!(created, Response::Status { error: None });

        handle_set_quotas(&handler, None, "ops".to_string(), 7, 3)
            .await
            .unwrap();

        match handle_query_roles(&handler, None, Some("ops".to_string()))
            .await
            .unwrap()
        {
            Response::Roles { roles, error } => {
                assert!(error.is_none());
                assert_eq!(roles.len(), 1);
                assert_eq!(roles[0].privileges[0].name, "read");
                assert_eq!(roles[0].read_quota, 7);
                assert_eq!(roles[0].write_quota, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_privilege_rejected() {
        let handler = handler();
        let err = handle_grant_privileges(
            &handler,
            None,
            "ops".to_string(),
            vec![privilege("superuser")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProxyError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let handler = handler();
        let created = handle_create_user(
            &handler,
            None,
            "alice".to_string(),
            "secret".to_string(),
            vec!["read".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(created, Response::Status { error: None });

        match handle_query_users(&handler, None, None).await.unwrap() {
            Response::Users { users, error } => {
                assert!(error.is_none());
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].user, "alice");
            }
            other => panic!("unexpected {:?}", other),
        }

        match handle_drop_user(&handler, None, "bob".to_string()).await.unwrap() {
            Response::Status { error } => assert_eq!(error.unwrap().result_code, 60),
            other => panic!("unexpected {:?}", other),
        }
    }
}
