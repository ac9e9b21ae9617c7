//! Key and record codec.

use std::collections::BTreeMap;

use kvproxy_client::protocol::{
    Bin as WireBin, Key as WireKey, Record as WireRecord, Value as WireValue,
};

use super::value::{decode_optional, decode_value, encode_value};
use crate::error::{ProxyError, ProxyResult};
use crate::store::{Bin, BinMap, Key, Record, DIGEST_SIZE};

/// Builds a key from its user value, or from a digest when no value is sent.
pub fn decode_key(key: WireKey) -> ProxyResult<Key> {
    match (key.value, key.digest) {
        (Some(value), _) => Key::new(&key.namespace, &key.set, decode_value(value)?)
            .map_err(|e| ProxyError::protocol(e.message)),
        (None, Some(digest)) => Ok(Key::from_digest(
            &key.namespace,
            &key.set,
            decode_digest(&digest)?,
        )),
        (None, None) => Err(ProxyError::protocol(
            "key requires a user value or a digest",
        )),
    }
}

pub fn decode_digest(digest: &[u8]) -> ProxyResult<[u8; DIGEST_SIZE]> {
    digest.try_into().map_err(|_| {
        ProxyError::protocol(format!(
            "digest must be {} bytes, got {}",
            DIGEST_SIZE,
            digest.len()
        ))
    })
}

/// Write bins, in caller order. A bin without a value clears that bin.
pub fn decode_bins(bins: Vec<WireBin>) -> ProxyResult<Vec<Bin>> {
    bins.into_iter()
        .map(|bin| Ok(Bin::new(bin.name, decode_optional(bin.value)?)))
        .collect()
}

pub fn encode_key(key: Key) -> WireKey {
    WireKey {
        namespace: key.namespace,
        set: key.set_name,
        value: key.user_key.map(encode_value),
        digest: Some(key.digest.to_vec()),
    }
}

pub fn encode_bins(bins: BinMap) -> BTreeMap<String, WireValue> {
    bins.into_iter()
        .map(|(name, value)| (name, encode_value(value)))
        .collect()
}

pub fn encode_record(record: Record) -> WireRecord {
    WireRecord {
        key: record.key.map(encode_key),
        generation: record.generation,
        expiration: record.expiration,
        bins: encode_bins(record.bins),
    }
}
