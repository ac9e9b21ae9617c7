//! In-process reference store.
//!
//! Implements record, batch, scan, secondary-index query, truncate, UDF
//! registry and user/role administration over in-memory maps. It does not
//! evaluate CDT, HLL or bitwise operations, filter expressions, or UDFs;
//! those calls fail with `UNSUPPORTED_FEATURE`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::admin::{
    CollectionType, IndexType, Privilege, PrivilegeCode, Role, UdfLanguage, UdfMeta, UserRoles,
};
use super::batch::{BatchItem, BatchRecord, BatchResults, ReadSelection};
use super::error::{result_code, StoreError, StoreResult};
use super::expression::FilterExpression;
use super::key::{Key, DIGEST_SIZE};
use super::operation::Operation;
use super::policy::{
    AdminPolicy, BasePolicy, BatchPolicy, GenerationPolicy, InfoPolicy, QueryPolicy,
    RecordExistsAction, ScanPolicy, WritePolicy,
};
use super::query::{Filter, PartitionFilter, RecordResult, Recordset, Statement, VecCursor};
use super::record::{Bin, BinMap, Record};
use super::value::Value;
use super::StoreClient;

/// Seconds between the Unix epoch and the store epoch (2010-01-01T00:00:00Z)
pub const STORE_EPOCH: i64 = 1_262_304_000;

const TTL_NEVER_EXPIRE: u32 = u32::MAX;
const TTL_DONT_UPDATE: u32 = u32::MAX - 1;

type RecordId = (String, [u8; DIGEST_SIZE]);

#[derive(Debug, Clone)]
struct StoredRecord {
    set_name: String,
    user_key: Option<Value>,
    generation: u32,
    /// Store-epoch seconds; 0 means never
    void_time: u32,
    last_update_nanos: i64,
    bins: BinMap,
}

impl StoredRecord {
    fn is_expired(&self, now: u32) -> bool {
        self.void_time != 0 && self.void_time <= now
    }

    fn to_record(&self, namespace: &str, digest: [u8; DIGEST_SIZE], bins: BinMap) -> Record {
        Record {
            key: Some(Key {
                namespace: namespace.to_string(),
                set_name: self.set_name.clone(),
                user_key: self.user_key.clone(),
                digest,
            }),
            generation: self.generation,
            expiration: self.void_time,
            bins,
        }
    }
}

#[derive(Debug, Clone)]
struct IndexDef {
    set_name: String,
    bin_name: String,
    index_type: IndexType,
    collection_type: CollectionType,
}

#[derive(Debug, Clone)]
struct UserEntry {
    password_hash: String,
    roles: Vec<String>,
}

pub struct MemoryStore {
    records: DashMap<RecordId, StoredRecord>,
    /// Keyed by (namespace, index name)
    indexes: RwLock<HashMap<(String, String), IndexDef>>,
    udfs: RwLock<BTreeMap<String, UdfMeta>>,
    users: RwLock<BTreeMap<String, UserEntry>>,
    roles: RwLock<BTreeMap<String, Role>>,
    /// Namespace default TTL in seconds; 0 means records never expire
    default_ttl: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let roles = PrivilegeCode::ALL
            .into_iter()
            .map(|code| {
                let role = Role {
                    name: code.as_str().to_string(),
                    privileges: vec![Privilege {
                        code,
                        namespace: String::new(),
                        set_name: String::new(),
                    }],
                    ..Role::default()
                };
                (role.name.clone(), role)
            })
            .collect();

        Self {
            records: DashMap::new(),
            indexes: RwLock::new(HashMap::new()),
            udfs: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
            roles: RwLock::new(roles),
            default_ttl: 0,
        }
    }

    pub fn with_default_ttl(mut self, ttl: u32) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Seeds an administrator holding every predefined role.
    pub fn with_admin(self, user: &str, password: &str) -> Self {
        self.users.write().insert(
            user.to_string(),
            UserEntry {
                password_hash: hash_hex(password.as_bytes()),
                roles: PrivilegeCode::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            },
        );
        self
    }

    /// Number of live records across all namespaces.
    pub fn len(&self) -> usize {
        let now = store_now();
        self.records.iter().filter(|r| !r.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_live(&self, key: &Key) -> StoreResult<StoredRecord> {
        let now = store_now();
        match self.records.get(&record_id(key)) {
            Some(rec) if !rec.is_expired(now) => Ok(rec.clone()),
            _ => Err(StoreError::key_not_found()),
        }
    }

    /// Runs `mutate` against the record's bins under the write policy and
    /// stores the outcome atomically. A record left without bins is removed.
    fn write_record<T, F>(
        &self,
        policy: &WritePolicy,
        key: &Key,
        mutate: F,
    ) -> StoreResult<(Option<StoredRecord>, T)>
    where
        F: FnOnce(&mut BinMap) -> StoreResult<T>,
    {
        reject_filter(&policy.base.filter_expression)?;
        let now = store_now();

        match self.records.entry(record_id(key)) {
            Entry::Occupied(mut occupied) => {
                let existing = if occupied.get().is_expired(now) {
                    None
                } else {
                    Some(occupied.get())
                };
                let (next, out) = apply_write(policy, key, existing, now, self.default_ttl, mutate)?;
                match &next {
                    Some(rec) => {
                        occupied.insert(rec.clone());
                    }
                    None => {
                        occupied.remove();
                    }
                }
                Ok((next, out))
            }
            Entry::Vacant(vacant) => {
                let (next, out) = apply_write(policy, key, None, now, self.default_ttl, mutate)?;
                if let Some(rec) = &next {
                    vacant.insert(rec.clone());
                }
                Ok((next, out))
            }
        }
    }

    fn delete_record(&self, policy: &WritePolicy, key: &Key) -> StoreResult<bool> {
        reject_filter(&policy.base.filter_expression)?;
        let now = store_now();
        match self.records.entry(record_id(key)) {
            Entry::Occupied(occupied) => {
                let live = !occupied.get().is_expired(now);
                if live {
                    check_generation(policy, occupied.get().generation)?;
                }
                occupied.remove();
                Ok(live)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    fn operate_record(
        &self,
        policy: &WritePolicy,
        key: &Key,
        operations: Vec<Operation>,
    ) -> StoreResult<Record> {
        if let Some(op) = operations
            .iter()
            .find(|op| matches!(op, Operation::Map(_) | Operation::List(_) | Operation::Hll(_) | Operation::Bit(_)))
        {
            return Err(StoreError::unsupported(format!(
                "collection operation on bin '{}' is not evaluated by the memory store",
                op.bin_name().unwrap_or_default()
            )));
        }

        if !operations.iter().any(Operation::is_write) {
            reject_filter(&policy.base.filter_expression)?;
            let rec = self.read_live(key)?;
            let mut out = BinMap::new();
            for op in &operations {
                read_into(&mut out, &rec.bins, op);
            }
            return Ok(rec.to_record(&key.namespace, key.digest, out));
        }

        let (next, out) = self.write_record(policy, key, |bins| {
            let mut out = BinMap::new();
            for op in operations {
                match op {
                    Operation::Put(bin) => {
                        bins.insert(bin.name, bin.value);
                    }
                    Operation::Add(bin) => add_bin(bins, bin)?,
                    Operation::Append(bin) => concat_bin(bins, bin, false)?,
                    Operation::Prepend(bin) => concat_bin(bins, bin, true)?,
                    Operation::Delete => bins.clear(),
                    Operation::Touch => {}
                    read => read_into(&mut out, bins, &read),
                }
            }
            Ok(out)
        })?;

        Ok(match next {
            Some(rec) => rec.to_record(&key.namespace, key.digest, out),
            None => Record {
                key: Some(key.clone()),
                generation: 0,
                expiration: 0,
                bins: out,
            },
        })
    }

    fn batch_item(&self, item: BatchItem) -> BatchRecord {
        let key = item.key().clone();
        let outcome = match item {
            BatchItem::Read {
                key,
                policy,
                selection,
            } => {
                let base = BasePolicy::from(&policy);
                let read = match selection {
                    ReadSelection::Bins(names) => self.read_bins(&base, &key, &names, false),
                    ReadSelection::AllBins => self.read_bins(&base, &key, &[], false),
                    ReadSelection::HeaderOnly => self.read_bins(&base, &key, &[], true),
                    ReadSelection::Operations(ops) => {
                        let write = WritePolicy {
                            base,
                            ..WritePolicy::default()
                        };
                        self.operate_record(&write, &key, ops)
                    }
                };
                read.map(Some)
            }
            BatchItem::Write { key, policy, ops } => self
                .operate_record(&WritePolicy::from(&policy), &key, ops)
                .map(Some),
            BatchItem::Delete { key, policy } => self
                .delete_record(&WritePolicy::from(&policy), &key)
                .and_then(|existed| {
                    if existed {
                        Ok(None)
                    } else {
                        Err(StoreError::key_not_found())
                    }
                }),
            BatchItem::Udf {
                policy,
                package_name,
                ..
            } => reject_filter(&policy.filter_expression)
                .and_then(|_| self.udf_unavailable(&package_name)),
        };

        match outcome {
            Ok(record) => BatchRecord {
                key,
                record,
                error: None,
                in_doubt: false,
            },
            Err(err) => BatchRecord {
                key,
                record: None,
                in_doubt: err.in_doubt,
                error: Some(err),
            },
        }
    }

    fn read_bins(
        &self,
        policy: &BasePolicy,
        key: &Key,
        bin_names: &[String],
        header_only: bool,
    ) -> StoreResult<Record> {
        reject_filter(&policy.filter_expression)?;
        let rec = self.read_live(key)?;
        let bins = if header_only {
            BinMap::new()
        } else {
            select_bins(&rec.bins, bin_names)
        };
        let mut record = rec.to_record(&key.namespace, key.digest, bins);
        // echo the caller's key so the user value survives without send_key
        record.key = Some(key.clone());
        Ok(record)
    }

    fn udf_unavailable<T>(&self, package_name: &str) -> StoreResult<T> {
        if !self.udfs.read().contains_key(package_name) {
            return Err(StoreError::new(
                result_code::UDF_BAD_RESPONSE,
                format!("UDF package '{}' is not registered", package_name),
            ));
        }
        Err(StoreError::unsupported(
            "UDF execution is not available in the memory store",
        ))
    }

    /// Live records of a namespace/set inside the partition filter, ordered
    /// by digest.
    fn snapshot(
        &self,
        namespace: &str,
        set_name: &str,
        partition_filter: &PartitionFilter,
    ) -> Vec<([u8; DIGEST_SIZE], StoredRecord)> {
        let now = store_now();
        let wanted: Vec<u32> = partition_filter.partitions.iter().map(|p| p.id).collect();

        let mut out: Vec<([u8; DIGEST_SIZE], StoredRecord)> = self
            .records
            .iter()
            .filter(|entry| {
                let ((ns, _), rec) = (entry.key(), entry.value());
                ns == namespace
                    && (set_name.is_empty() || rec.set_name == set_name)
                    && !rec.is_expired(now)
            })
            .filter(|entry| {
                let digest = entry.key().1;
                let key = Key::from_digest(namespace, "", digest);
                if wanted.is_empty() {
                    partition_filter.contains(&key)
                } else {
                    wanted.contains(&key.partition_id())
                }
            })
            .map(|entry| (entry.key().1, entry.value().clone()))
            .collect();

        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn find_index(&self, statement: &Statement, filter: &Filter) -> StoreResult<()> {
        let indexes = self.indexes.read();
        let found = indexes.iter().any(|((ns, name), def)| {
            ns == &statement.namespace
                && statement.index_name.as_ref().is_none_or(|n| n == name)
                && def.bin_name == filter.bin_name
                && def.collection_type == filter.collection_type
                && (def.set_name.is_empty() || def.set_name == statement.set_name)
                && index_accepts(def.index_type, &filter.begin)
        });
        if found {
            Ok(())
        } else {
            Err(StoreError::new(
                result_code::INDEX_NOTFOUND,
                format!("No index on bin '{}'", filter.bin_name),
            ))
        }
    }

    fn with_role<T>(
        &self,
        role_name: &str,
        f: impl FnOnce(&mut Role) -> T,
    ) -> StoreResult<T> {
        let mut roles = self.roles.write();
        match roles.get_mut(role_name) {
            Some(role) => Ok(f(role)),
            None => Err(invalid_role(role_name)),
        }
    }

    fn with_user<T>(
        &self,
        user: &str,
        f: impl FnOnce(&mut UserEntry) -> T,
    ) -> StoreResult<T> {
        let mut users = self.users.write();
        match users.get_mut(user) {
            Some(entry) => Ok(f(entry)),
            None => Err(invalid_user(user)),
        }
    }

    fn check_roles_exist(&self, roles: &[String]) -> StoreResult<()> {
        let known = self.roles.read();
        match roles.iter().find(|r| !known.contains_key(r.as_str())) {
            Some(missing) => Err(invalid_role(missing)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(
        &self,
        policy: &BasePolicy,
        key: &Key,
        bin_names: &[String],
    ) -> StoreResult<Record> {
        self.read_bins(policy, key, bin_names, false)
    }

    async fn get_header(&self, policy: &BasePolicy, key: &Key) -> StoreResult<Record> {
        self.read_bins(policy, key, &[], true)
    }

    async fn exists(&self, policy: &BasePolicy, key: &Key) -> StoreResult<bool> {
        reject_filter(&policy.filter_expression)?;
        match self.read_live(key) {
            Ok(_) => Ok(true),
            Err(e) if e.result_code == result_code::KEY_NOT_FOUND_ERROR => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()> {
        self.write_record(policy, key, |current| {
            for bin in bins {
                current.insert(bin.name, bin.value);
            }
            Ok(())
        })
        .map(|_| ())
    }

    async fn add(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()> {
        self.write_record(policy, key, |current| {
            bins.into_iter().try_for_each(|bin| add_bin(current, bin))
        })
        .map(|_| ())
    }

    async fn append(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()> {
        self.write_record(policy, key, |current| {
            bins.into_iter()
                .try_for_each(|bin| concat_bin(current, bin, false))
        })
        .map(|_| ())
    }

    async fn prepend(&self, policy: &WritePolicy, key: &Key, bins: Vec<Bin>) -> StoreResult<()> {
        self.write_record(policy, key, |current| {
            bins.into_iter()
                .try_for_each(|bin| concat_bin(current, bin, true))
        })
        .map(|_| ())
    }

    async fn delete(&self, policy: &WritePolicy, key: &Key) -> StoreResult<bool> {
        self.delete_record(policy, key)
    }

    async fn touch(&self, policy: &WritePolicy, key: &Key) -> StoreResult<()> {
        let policy = WritePolicy {
            record_exists_action: RecordExistsAction::UpdateOnly,
            ..policy.clone()
        };
        self.write_record(&policy, key, |_| Ok(())).map(|_| ())
    }

    async fn operate(
        &self,
        policy: &WritePolicy,
        key: &Key,
        operations: Vec<Operation>,
    ) -> StoreResult<Record> {
        self.operate_record(policy, key, operations)
    }

    async fn batch_operate(&self, policy: &BatchPolicy, items: Vec<BatchItem>) -> BatchResults {
        if let Err(err) = reject_filter(&policy.base.filter_expression) {
            return BatchResults {
                records: Vec::new(),
                error: Some(err),
            };
        }

        BatchResults {
            records: items.into_iter().map(|item| self.batch_item(item)).collect(),
            error: None,
        }
    }

    async fn create_index(
        &self,
        _policy: &WritePolicy,
        namespace: &str,
        set_name: &str,
        index_name: &str,
        bin_name: &str,
        index_type: IndexType,
        collection_type: CollectionType,
    ) -> StoreResult<()> {
        let mut indexes = self.indexes.write();
        let id = (namespace.to_string(), index_name.to_string());
        if indexes.contains_key(&id) {
            return Err(StoreError::new(
                result_code::INDEX_FOUND,
                format!("Index '{}' already exists", index_name),
            ));
        }
        indexes.insert(
            id,
            IndexDef {
                set_name: set_name.to_string(),
                bin_name: bin_name.to_string(),
                index_type,
                collection_type,
            },
        );
        tracing::debug!("Created index {}.{} on bin {}", namespace, index_name, bin_name);
        Ok(())
    }

    async fn drop_index(
        &self,
        _policy: &WritePolicy,
        namespace: &str,
        _set_name: &str,
        index_name: &str,
    ) -> StoreResult<()> {
        let removed = self
            .indexes
            .write()
            .remove(&(namespace.to_string(), index_name.to_string()));
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::new(
                result_code::INDEX_NOTFOUND,
                format!("Index '{}' not found", index_name),
            )),
        }
    }

    async fn truncate(
        &self,
        _policy: &InfoPolicy,
        namespace: &str,
        set_name: &str,
        before: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let cutoff = before.and_then(|t| t.timestamp_nanos_opt());
        self.records.retain(|(ns, _), rec| {
            let in_scope = ns == namespace && (set_name.is_empty() || rec.set_name == set_name);
            let old_enough = cutoff.map_or(true, |c| rec.last_update_nanos < c);
            !(in_scope && old_enough)
        });
        Ok(())
    }

    async fn register_udf(
        &self,
        _policy: &WritePolicy,
        body: Vec<u8>,
        package_name: &str,
        language: UdfLanguage,
    ) -> StoreResult<()> {
        if package_name.is_empty() {
            return Err(StoreError::parameter("UDF package name is empty"));
        }
        self.udfs.write().insert(
            package_name.to_string(),
            UdfMeta {
                filename: package_name.to_string(),
                hash: hash_hex(&body),
                language,
            },
        );
        Ok(())
    }

    async fn drop_udf(&self, _policy: &WritePolicy, package_name: &str) -> StoreResult<()> {
        match self.udfs.write().remove(package_name) {
            Some(_) => Ok(()),
            None => Err(StoreError::new(
                result_code::UDF_BAD_RESPONSE,
                format!("UDF package '{}' is not registered", package_name),
            )),
        }
    }

    async fn list_udf(&self, _policy: &BasePolicy) -> StoreResult<Vec<UdfMeta>> {
        Ok(self.udfs.read().values().cloned().collect())
    }

    async fn execute_udf(
        &self,
        policy: &WritePolicy,
        _key: &Key,
        package_name: &str,
        _function_name: &str,
        _args: Vec<Value>,
    ) -> StoreResult<Option<Value>> {
        reject_filter(&policy.base.filter_expression)?;
        self.udf_unavailable(package_name)
    }

    async fn create_user(
        &self,
        _policy: &AdminPolicy,
        user: &str,
        password: &str,
        roles: Vec<String>,
    ) -> StoreResult<()> {
        if user.is_empty() {
            return Err(invalid_user(user));
        }
        self.check_roles_exist(&roles)?;
        let mut users = self.users.write();
        if users.contains_key(user) {
            return Err(StoreError::new(
                result_code::USER_ALREADY_EXISTS,
                format!("User '{}' already exists", user),
            ));
        }
        users.insert(
            user.to_string(),
            UserEntry {
                password_hash: hash_hex(password.as_bytes()),
                roles,
            },
        );
        Ok(())
    }

    async fn drop_user(&self, _policy: &AdminPolicy, user: &str) -> StoreResult<()> {
        match self.users.write().remove(user) {
            Some(_) => Ok(()),
            None => Err(invalid_user(user)),
        }
    }

    async fn change_password(
        &self,
        _policy: &AdminPolicy,
        user: &str,
        password: &str,
    ) -> StoreResult<()> {
        self.with_user(user, |entry| {
            entry.password_hash = hash_hex(password.as_bytes());
        })
    }

    async fn grant_roles(
        &self,
        _policy: &AdminPolicy,
        user: &str,
        roles: Vec<String>,
    ) -> StoreResult<()> {
        self.check_roles_exist(&roles)?;
        self.with_user(user, |entry| {
            for role in roles {
                if !entry.roles.contains(&role) {
                    entry.roles.push(role);
                }
            }
        })
    }

    async fn revoke_roles(
        &self,
        _policy: &AdminPolicy,
        user: &str,
        roles: Vec<String>,
    ) -> StoreResult<()> {
        self.with_user(user, |entry| entry.roles.retain(|r| !roles.contains(r)))
    }

    async fn query_users(
        &self,
        _policy: &AdminPolicy,
        user: Option<&str>,
    ) -> StoreResult<Vec<UserRoles>> {
        let users = self.users.read();
        let to_roles = |name: &String, entry: &UserEntry| UserRoles {
            user: name.clone(),
            roles: entry.roles.clone(),
            ..UserRoles::default()
        };
        match user {
            Some(name) => users
                .get_key_value(name)
                .map(|(n, e)| vec![to_roles(n, e)])
                .ok_or_else(|| invalid_user(name)),
            None => Ok(users.iter().map(|(n, e)| to_roles(n, e)).collect()),
        }
    }

    async fn query_roles(
        &self,
        _policy: &AdminPolicy,
        role_name: Option<&str>,
    ) -> StoreResult<Vec<Role>> {
        let roles = self.roles.read();
        match role_name {
            Some(name) => roles
                .get(name)
                .map(|r| vec![r.clone()])
                .ok_or_else(|| invalid_role(name)),
            None => Ok(roles.values().cloned().collect()),
        }
    }

    async fn create_role(&self, _policy: &AdminPolicy, role: Role) -> StoreResult<()> {
        if role.name.is_empty() {
            return Err(invalid_role(&role.name));
        }
        let mut roles = self.roles.write();
        if roles.contains_key(&role.name) {
            return Err(StoreError::new(
                result_code::ROLE_ALREADY_EXISTS,
                format!("Role '{}' already exists", role.name),
            ));
        }
        roles.insert(role.name.clone(), role);
        Ok(())
    }

    async fn drop_role(&self, _policy: &AdminPolicy, role_name: &str) -> StoreResult<()> {
        if PrivilegeCode::parse(role_name).is_some() {
            return Err(StoreError::new(
                result_code::INVALID_ROLE,
                format!("Predefined role '{}' cannot be dropped", role_name),
            ));
        }
        match self.roles.write().remove(role_name) {
            Some(_) => {
                for entry in self.users.write().values_mut() {
                    entry.roles.retain(|r| r != role_name);
                }
                Ok(())
            }
            None => Err(invalid_role(role_name)),
        }
    }

    async fn grant_privileges(
        &self,
        _policy: &AdminPolicy,
        role_name: &str,
        privileges: Vec<Privilege>,
    ) -> StoreResult<()> {
        self.with_role(role_name, |role| {
            for p in privileges {
                if !role.privileges.contains(&p) {
                    role.privileges.push(p);
                }
            }
        })
    }

    async fn revoke_privileges(
        &self,
        _policy: &AdminPolicy,
        role_name: &str,
        privileges: Vec<Privilege>,
    ) -> StoreResult<()> {
        self.with_role(role_name, |role| {
            role.privileges.retain(|p| !privileges.contains(p))
        })
    }

    async fn set_allowlist(
        &self,
        _policy: &AdminPolicy,
        role_name: &str,
        allowlist: Vec<String>,
    ) -> StoreResult<()> {
        self.with_role(role_name, |role| role.allowlist = allowlist)
    }

    async fn set_quotas(
        &self,
        _policy: &AdminPolicy,
        role_name: &str,
        read_quota: u32,
        write_quota: u32,
    ) -> StoreResult<()> {
        self.with_role(role_name, |role| {
            role.read_quota = read_quota;
            role.write_quota = write_quota;
        })
    }

    async fn scan_partitions(
        &self,
        policy: &ScanPolicy,
        partition_filter: PartitionFilter,
        namespace: &str,
        set_name: &str,
        bin_names: Vec<String>,
    ) -> StoreResult<Recordset> {
        reject_filter(&policy.multi.base.filter_expression)?;

        let limit = match policy.multi.max_records {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        let items: Vec<RecordResult> = self
            .snapshot(namespace, set_name, &partition_filter)
            .into_iter()
            .take(limit)
            .map(|(digest, rec)| {
                let bins = if policy.multi.include_bin_data {
                    select_bins(&rec.bins, &bin_names)
                } else {
                    BinMap::new()
                };
                RecordResult::record(rec.to_record(namespace, digest, bins))
            })
            .collect();

        tracing::debug!("Scan of {}.{} matched {} records", namespace, set_name, items.len());
        Ok(Recordset::new(Box::new(VecCursor::new(items))))
    }

    async fn query_partitions(
        &self,
        policy: &QueryPolicy,
        statement: Statement,
        partition_filter: PartitionFilter,
    ) -> StoreResult<Recordset> {
        reject_filter(&policy.multi.base.filter_expression)?;
        if let Some(filter) = &statement.filter {
            self.find_index(&statement, filter)?;
        }

        let limit = match policy.multi.max_records {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        let items: Vec<RecordResult> = self
            .snapshot(&statement.namespace, &statement.set_name, &partition_filter)
            .into_iter()
            .filter(|(_, rec)| {
                statement
                    .filter
                    .as_ref()
                    .is_none_or(|f| filter_matches(f, &rec.bins))
            })
            .take(limit)
            .map(|(digest, rec)| {
                let bins = if policy.multi.include_bin_data {
                    select_bins(&rec.bins, &statement.bin_names)
                } else {
                    BinMap::new()
                };
                RecordResult::record(rec.to_record(&statement.namespace, digest, bins))
            })
            .collect();

        Ok(Recordset::new(Box::new(VecCursor::new(items))))
    }
}

// ==================== Helpers ====================

fn record_id(key: &Key) -> RecordId {
    (key.namespace.clone(), key.digest)
}

/// Current time in store-epoch seconds.
pub fn store_now() -> u32 {
    u32::try_from(Utc::now().timestamp() - STORE_EPOCH).unwrap_or(0)
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn hash_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn reject_filter(filter: &Option<FilterExpression>) -> StoreResult<()> {
    match filter {
        Some(_) => Err(StoreError::unsupported(
            "filter expressions are not evaluated by the memory store",
        )),
        None => Ok(()),
    }
}

fn invalid_user(user: &str) -> StoreError {
    StoreError::new(result_code::INVALID_USER, format!("Invalid user '{}'", user))
}

fn invalid_role(role: &str) -> StoreError {
    StoreError::new(result_code::INVALID_ROLE, format!("Invalid role '{}'", role))
}

fn check_generation(policy: &WritePolicy, current: u32) -> StoreResult<()> {
    let ok = match policy.generation_policy {
        GenerationPolicy::None => true,
        GenerationPolicy::ExpectGenEqual => current == policy.generation,
        GenerationPolicy::ExpectGenGt => policy.generation > current,
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::new(
            result_code::GENERATION_ERROR,
            format!("Generation mismatch: record is at {}", current),
        ))
    }
}

fn apply_write<T, F>(
    policy: &WritePolicy,
    key: &Key,
    existing: Option<&StoredRecord>,
    now: u32,
    default_ttl: u32,
    mutate: F,
) -> StoreResult<(Option<StoredRecord>, T)>
where
    F: FnOnce(&mut BinMap) -> StoreResult<T>,
{
    use RecordExistsAction::*;

    match (policy.record_exists_action, existing) {
        (UpdateOnly | ReplaceOnly, None) => return Err(StoreError::key_not_found()),
        (CreateOnly, Some(_)) => {
            return Err(StoreError::new(
                result_code::KEY_EXISTS_ERROR,
                "Key already exists",
            ))
        }
        _ => {}
    }
    if let Some(rec) = existing {
        check_generation(policy, rec.generation)?;
    }

    let mut bins = match (policy.record_exists_action, existing) {
        (Update | UpdateOnly, Some(rec)) => rec.bins.clone(),
        _ => BinMap::new(),
    };
    let out = mutate(&mut bins)?;
    bins.retain(|_, v| !v.is_nil());
    if bins.is_empty() {
        return Ok((None, out));
    }

    let void_time = match policy.expiration {
        TTL_NEVER_EXPIRE => 0,
        TTL_DONT_UPDATE => existing.map_or(0, |r| r.void_time),
        0 if default_ttl == 0 => 0,
        0 => now.saturating_add(default_ttl),
        ttl => now.saturating_add(ttl),
    };
    let user_key = if policy.base.send_key {
        key.user_key.clone()
    } else {
        existing.and_then(|r| r.user_key.clone())
    };
    let generation = match existing.map_or(0, |r| r.generation).wrapping_add(1) {
        0 => 1,
        g => g,
    };

    Ok((
        Some(StoredRecord {
            set_name: key.set_name.clone(),
            user_key,
            generation,
            void_time,
            last_update_nanos: now_nanos(),
            bins,
        }),
        out,
    ))
}

fn select_bins(bins: &BinMap, names: &[String]) -> BinMap {
    if names.is_empty() {
        return bins.clone();
    }
    names
        .iter()
        .filter_map(|n| bins.get(n).map(|v| (n.clone(), v.clone())))
        .collect()
}

fn read_into(out: &mut BinMap, bins: &BinMap, op: &Operation) {
    match op {
        Operation::Get => out.extend(bins.iter().map(|(k, v)| (k.clone(), v.clone()))),
        Operation::GetBin(name) => {
            if let Some(v) = bins.get(name) {
                out.insert(name.clone(), v.clone());
            }
        }
        _ => {}
    }
}

fn add_bin(bins: &mut BinMap, bin: Bin) -> StoreResult<()> {
    let sum = match (bins.get(&bin.name), bin.value) {
        (None, v @ (Value::Int(_) | Value::Float(_))) => v,
        (Some(Value::Int(a)), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
        (Some(Value::Float(a)), Value::Float(b)) => Value::Float(a + b),
        (_, v @ (Value::Int(_) | Value::Float(_))) => {
            return Err(StoreError::bin_type(format!(
                "Cannot add {} to bin '{}'",
                v.type_name(),
                bin.name
            )))
        }
        (_, v) => {
            return Err(StoreError::parameter(format!(
                "Cannot add a {} value",
                v.type_name()
            )))
        }
    };
    bins.insert(bin.name, sum);
    Ok(())
}

fn concat_bin(bins: &mut BinMap, bin: Bin, prepend: bool) -> StoreResult<()> {
    let joined = match (bins.get(&bin.name), bin.value) {
        (None, v @ (Value::String(_) | Value::Blob(_))) => v,
        (Some(Value::String(cur)), Value::String(s)) => Value::String(if prepend {
            s + cur
        } else {
            format!("{}{}", cur, s)
        }),
        (Some(Value::Blob(cur)), Value::Blob(b)) => Value::Blob(if prepend {
            [b.as_slice(), cur.as_slice()].concat()
        } else {
            [cur.as_slice(), b.as_slice()].concat()
        }),
        (_, v @ (Value::String(_) | Value::Blob(_))) => {
            return Err(StoreError::bin_type(format!(
                "Cannot concatenate {} to bin '{}'",
                v.type_name(),
                bin.name
            )))
        }
        (_, v) => {
            return Err(StoreError::parameter(format!(
                "Cannot concatenate a {} value",
                v.type_name()
            )))
        }
    };
    bins.insert(bin.name, joined);
    Ok(())
}

fn index_accepts(index_type: IndexType, value: &Value) -> bool {
    match index_type {
        IndexType::Numeric => matches!(value, Value::Int(_)),
        IndexType::String => matches!(value, Value::String(_)),
        IndexType::Blob => matches!(value, Value::Blob(_)),
        IndexType::Geo2DSphere => matches!(value, Value::GeoJson(_)),
    }
}

fn filter_matches(filter: &Filter, bins: &BinMap) -> bool {
    let Some(value) = bins.get(&filter.bin_name) else {
        return false;
    };
    let candidates: Vec<&Value> = match (filter.collection_type, value) {
        (CollectionType::Default, v) => vec![v],
        (CollectionType::List, Value::List(items)) => items.iter().collect(),
        (CollectionType::MapKeys, Value::Map(m)) => m.iter().map(|(k, _)| k).collect(),
        (CollectionType::MapValues, Value::Map(m)) => m.iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };
    candidates
        .into_iter()
        .any(|c| in_range(c, &filter.begin, &filter.end))
}

fn in_range(value: &Value, begin: &Value, end: &Value) -> bool {
    match (value, begin, end) {
        (Value::Int(v), Value::Int(b), Value::Int(e)) => b <= v && v <= e,
        _ => value == begin,
    }
}
