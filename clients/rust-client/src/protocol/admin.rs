use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Numeric,
    String,
    Blob,
    Geo2dSphere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexCollectionType {
    #[default]
    Default,
    List,
    MapKeys,
    MapValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UdfLanguage {
    Lua,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfMeta {
    pub package_name: String,
    pub hash: String,
    pub language: UdfLanguage,
}

/// A privilege grant. `name` is one of the store's privilege codes
/// (`read`, `read-write`, `sys-admin`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub set_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    #[serde(default)]
    pub allowlist: Vec<String>,
    #[serde(default)]
    pub read_quota: u32,
    #[serde(default)]
    pub write_quota: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub read_info: Vec<u64>,
    #[serde(default)]
    pub write_info: Vec<u64>,
    #[serde(default)]
    pub conns_in_use: u64,
}
