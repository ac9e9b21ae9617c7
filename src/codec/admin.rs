//! Index, UDF, truncate and user/role translation.

use chrono::{DateTime, Utc};
use kvproxy_client::protocol as wire;

use crate::error::{ProxyError, ProxyResult};
use crate::store::{
    CollectionType, IndexType, Privilege, PrivilegeCode, Role, UdfLanguage, UdfMeta, UserRoles,
};

pub fn decode_index_type(index_type: wire::IndexType) -> IndexType {
    match index_type {
        wire::IndexType::Numeric => IndexType::Numeric,
        wire::IndexType::String => IndexType::String,
        wire::IndexType::Blob => IndexType::Blob,
        wire::IndexType::Geo2dSphere => IndexType::Geo2DSphere,
    }
}

pub fn decode_collection_type(collection: wire::IndexCollectionType) -> CollectionType {
    match collection {
        wire::IndexCollectionType::Default => CollectionType::Default,
        wire::IndexCollectionType::List => CollectionType::List,
        wire::IndexCollectionType::MapKeys => CollectionType::MapKeys,
        wire::IndexCollectionType::MapValues => CollectionType::MapValues,
    }
}

pub fn decode_udf_language(language: wire::UdfLanguage) -> UdfLanguage {
    match language {
        wire::UdfLanguage::Lua => UdfLanguage::Lua,
    }
}

pub fn encode_udf_meta(meta: UdfMeta) -> wire::UdfMeta {
    wire::UdfMeta {
        package_name: meta.filename,
        hash: meta.hash,
        language: match meta.language {
            UdfLanguage::Lua => wire::UdfLanguage::Lua,
        },
    }
}

/// Any present cutoff is used as-is, zero and negative included.
pub fn decode_truncate_before(before_nanos: Option<i64>) -> Option<DateTime<Utc>> {
    before_nanos.map(DateTime::from_timestamp_nanos)
}

// ==================== Users & Roles ====================

pub fn decode_privilege(privilege: wire::Privilege) -> ProxyResult<Privilege> {
    let code = PrivilegeCode::parse(&privilege.name).ok_or_else(|| {
        ProxyError::protocol(format!("unknown privilege code '{}'", privilege.name))
    })?;
    Ok(Privilege {
        code,
        namespace: privilege.namespace,
        set_name: privilege.set_name,
    })
}

pub fn decode_privileges(privileges: Vec<wire::Privilege>) -> ProxyResult<Vec<Privilege>> {
    privileges.into_iter().map(decode_privilege).collect()
}

pub fn encode_privilege(privilege: Privilege) -> wire::Privilege {
    wire::Privilege {
        name: privilege.code.as_str().to_string(),
        namespace: privilege.namespace,
        set_name: privilege.set_name,
    }
}

pub fn encode_role(role: Role) -> wire::Role {
    wire::Role {
        name: role.name,
        privileges: role.privileges.into_iter().map(encode_privilege).collect(),
        allowlist: role.allowlist,
        read_quota: role.read_quota,
        write_quota: role.write_quota,
    }
}

pub fn encode_user(user: UserRoles) -> wire::UserRole {
    wire::UserRole {
        user: user.user,
        roles: user.roles,
        read_info: user.read_info,
        write_info: user.write_info,
        conns_in_use: user.conns_in_use,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_roundtrip() {
        let decoded = decode_privilege(wire::Privilege {
            name: "read-write-udf".to_string(),
            namespace: "test".to_string(),
            set_name: String::new(),
        })
        .unwrap();
        assert_eq!(decoded.code, PrivilegeCode::ReadWriteUdf);

        let encoded = encode_privilege(decoded);
        assert_eq!(encoded.name, "read-write-udf");
        assert_eq!(encoded.namespace, "test");
    }

    #[test]
    fn test_unknown_privilege_is_protocol_error() {
        let err = decode_privilege(wire::Privilege {
            name: "root".to_string(),
            namespace: String::new(),
            set_name: String::new(),
        })
        .unwrap_err();
        assert!(matches!(err, ProxyError::Protocol(_)));
    }

    #[test]
    fn test_truncate_before() {
        assert_eq!(decode_truncate_before(None), None);

        let ts = decode_truncate_before(Some(1_700_000_000_123_456_789)).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);

        let epoch = decode_truncate_before(Some(0)).unwrap();
        assert_eq!(epoch.timestamp(), 0);
    }

    #[test]
    fn test_index_types() {
        assert_eq!(
            decode_index_type(wire::IndexType::Geo2dSphere),
            IndexType::Geo2DSphere
        );
        assert_eq!(
            decode_collection_type(wire::IndexCollectionType::MapValues),
            CollectionType::MapValues
        );
    }

    #[test]
    fn test_encode_role_and_user() {
        let role = encode_role(Role {
            name: "ops".to_string(),
            privileges: vec![Privilege {
                code: PrivilegeCode::Truncate,
                namespace: String::new(),
                set_name: String::new(),
            }],
            allowlist: vec!["10.0.0.0/8".to_string()],
            read_quota: 10,
            write_quota: 0,
        });
        assert_eq!(role.privileges[0].name, "truncate");
        assert_eq!(role.read_quota, 10);

        let user = encode_user(UserRoles {
            user: "alice".to_string(),
            roles: vec!["ops".to_string()],
            ..Default::default()
        });
        assert_eq!(user.user, "alice");
        assert_eq!(user.roles, vec!["ops".to_string()]);
    }
}
