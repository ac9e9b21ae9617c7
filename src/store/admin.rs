use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    Numeric,
    String,
    Blob,
    Geo2DSphere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionType {
    #[default]
    Default,
    List,
    MapKeys,
    MapValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdfLanguage {
    Lua,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdfMeta {
    pub filename: String,
    pub hash: String,
    pub language: UdfLanguage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeCode {
    UserAdmin,
    SysAdmin,
    DataAdmin,
    UdfAdmin,
    SIndexAdmin,
    Read,
    ReadWrite,
    ReadWriteUdf,
    Write,
    Truncate,
}

impl PrivilegeCode {
    pub const ALL: [PrivilegeCode; 10] = [
        PrivilegeCode::UserAdmin,
        PrivilegeCode::SysAdmin,
        PrivilegeCode::DataAdmin,
        PrivilegeCode::UdfAdmin,
        PrivilegeCode::SIndexAdmin,
        PrivilegeCode::Read,
        PrivilegeCode::ReadWrite,
        PrivilegeCode::ReadWriteUdf,
        PrivilegeCode::Write,
        PrivilegeCode::Truncate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeCode::UserAdmin => "user-admin",
            PrivilegeCode::SysAdmin => "sys-admin",
            PrivilegeCode::DataAdmin => "data-admin",
            PrivilegeCode::UdfAdmin => "udf-admin",
            PrivilegeCode::SIndexAdmin => "sindex-admin",
            PrivilegeCode::Read => "read",
            PrivilegeCode::ReadWrite => "read-write",
            PrivilegeCode::ReadWriteUdf => "read-write-udf",
            PrivilegeCode::Write => "write",
            PrivilegeCode::Truncate => "truncate",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == name)
    }
}

impl fmt::Display for PrivilegeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    pub code: PrivilegeCode,
    pub namespace: String,
    pub set_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Role {
    pub name: String,
    pub privileges: Vec<Privilege>,
    pub allowlist: Vec<String>,
    pub read_quota: u32,
    pub write_quota: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserRoles {
    pub user: String,
    pub roles: Vec<String>,
    pub read_info: Vec<u64>,
    pub write_info: Vec<u64>,
    pub conns_in_use: u64,
}
