use sha2::{Digest, Sha256};

use super::error::{StoreError, StoreResult};
use super::value::Value;

pub const DIGEST_SIZE: usize = 20;

/// Record identity. The digest is derived from set name and user key when a
/// key is built from a user value, or carried as given otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub namespace: String,
    pub set_name: String,
    pub user_key: Option<Value>,
    pub digest: [u8; DIGEST_SIZE],
}

impl Key {
    /// Builds a key from a user value. Only integer, string and blob user
    /// keys are accepted.
    pub fn new(namespace: &str, set_name: &str, user_key: Value) -> StoreResult<Self> {
        let digest = compute_digest(set_name, &user_key)?;
        Ok(Self {
            namespace: namespace.to_string(),
            set_name: set_name.to_string(),
            user_key: Some(user_key),
            digest,
        })
    }

    pub fn from_digest(namespace: &str, set_name: &str, digest: [u8; DIGEST_SIZE]) -> Self {
        Self {
            namespace: namespace.to_string(),
            set_name: set_name.to_string(),
            user_key: None,
            digest,
        }
    }

    /// Partition this key belongs to, out of 4096.
    pub fn partition_id(&self) -> u32 {
        u32::from(u16::from_le_bytes([self.digest[0], self.digest[1]])) & 0x0FFF
    }
}

fn compute_digest(set_name: &str, user_key: &Value) -> StoreResult<[u8; DIGEST_SIZE]> {
    let mut hasher = Sha256::new();
    hasher.update(set_name.as_bytes());
    hasher.update([user_key.particle_type() as u8]);
    match user_key {
        Value::Int(v) => hasher.update(v.to_be_bytes()),
        Value::String(v) => hasher.update(v.as_bytes()),
        Value::Blob(v) => hasher.update(v),
        other => {
            return Err(StoreError::parameter(format!(
                "Invalid key type: {}",
                other.type_name()
            )))
        }
    }

    let full = hasher.finalize();
    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&full[..DIGEST_SIZE]);
    Ok(digest)
}
