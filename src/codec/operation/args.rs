//! Positional argument reader shared by the operation decoders.
//!
//! Arity is checked once when the reader is built; accessors then consume
//! arguments left to right, each checking the variant it expects and
//! narrowing integers to their native width.

use kvproxy_client::protocol::Value as WireValue;

use crate::codec::value::decode_value;
use crate::error::{ProxyError, ProxyResult};
use crate::store::{Value, ValueMap};

pub struct Args {
    label: String,
    values: std::vec::IntoIter<WireValue>,
}

impl Args {
    /// Fails with a protocol error unless `values.len()` is one of `arity`.
    pub fn new(label: String, values: Vec<WireValue>, arity: &[usize]) -> ProxyResult<Self> {
        if !arity.contains(&values.len()) {
            return Err(ProxyError::protocol(format!(
                "{} expects {} argument(s), got {}",
                label,
                arity_text(arity),
                values.len()
            )));
        }
        Ok(Self {
            label,
            values: values.into_iter(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn next(&mut self, name: &str) -> ProxyResult<WireValue> {
        self.values
            .next()
            .ok_or_else(|| ProxyError::protocol(format!("{}: missing {}", self.label, name)))
    }

    fn mismatch(&self, name: &str, expected: &str, got: &str) -> ProxyError {
        ProxyError::protocol(format!(
            "{}: {} must be {}, got {}",
            self.label, name, expected, got
        ))
    }

    pub fn value(&mut self, name: &str) -> ProxyResult<Value> {
        decode_value(self.next(name)?)
    }

    pub fn int(&mut self, name: &str) -> ProxyResult<i64> {
        match self.next(name)? {
            WireValue::Int(v) => Ok(v),
            other => Err(self.mismatch(name, "an integer", wire_type(&other))),
        }
    }

    pub fn flag(&mut self, name: &str) -> ProxyResult<bool> {
        match self.next(name)? {
            WireValue::Bool(v) => Ok(v),
            other => Err(self.mismatch(name, "a bool", wire_type(&other))),
        }
    }

    pub fn string(&mut self, name: &str) -> ProxyResult<String> {
        match self.next(name)? {
            WireValue::String(v) => Ok(v),
            other => Err(self.mismatch(name, "a string", wire_type(&other))),
        }
    }

    pub fn blob(&mut self, name: &str) -> ProxyResult<Vec<u8>> {
        match self.next(name)? {
            WireValue::Blob(v) => Ok(v),
            other => Err(self.mismatch(name, "a blob", wire_type(&other))),
        }
    }

    pub fn list(&mut self, name: &str) -> ProxyResult<Vec<Value>> {
        match self.value(name)? {
            Value::List(items) => Ok(items),
            other => Err(self.mismatch(name, "a list", other.type_name())),
        }
    }

    pub fn map(&mut self, name: &str) -> ProxyResult<ValueMap> {
        match self.value(name)? {
            Value::Map(map) => Ok(map),
            other => Err(self.mismatch(name, "a map", other.type_name())),
        }
    }

    /// A list whose every element is an HLL payload.
    pub fn hll_list(&mut self, name: &str) -> ProxyResult<Vec<Vec<u8>>> {
        let label = self.label.clone();
        self.list(name)?
            .into_iter()
            .map(|item| match item {
                Value::Hll(bytes) => Ok(bytes),
                other => Err(ProxyError::protocol(format!(
                    "{}: {} must only hold hll values, got {}",
                    label,
                    name,
                    other.type_name()
                ))),
            })
            .collect()
    }

    // ==================== Narrowing ====================

    fn narrow<T: TryFrom<i64>>(&mut self, name: &str, kind: &str) -> ProxyResult<T> {
        let v = self.int(name)?;
        T::try_from(v).map_err(|_| {
            ProxyError::validation(format!(
                "{}: {} {} does not fit in {}",
                self.label, name, v, kind
            ))
        })
    }

    /// List/map index, rank, or bit/byte offset.
    pub fn index(&mut self, name: &str) -> ProxyResult<i32> {
        self.narrow(name, "i32")
    }

    /// Counts, sizes and shift amounts.
    pub fn count(&mut self, name: &str) -> ProxyResult<u32> {
        self.narrow(name, "u32")
    }

    /// HLL bit counts; -1 keeps the bin's current setting.
    pub fn bits(&mut self, name: &str) -> ProxyResult<i8> {
        let v: i8 = self.narrow(name, "i8")?;
        if v < -1 {
            return Err(ProxyError::validation(format!(
                "{}: {} must be -1 or greater, got {}",
                self.label, name, v
            )));
        }
        Ok(v)
    }

    /// Small integer flag sets restricted to `max` (inclusive).
    pub fn flags(&mut self, name: &str, max: u32) -> ProxyResult<u32> {
        let v = self.count(name)?;
        if v > max {
            return Err(ProxyError::validation(format!(
                "{}: {} {} is outside 0..={}",
                self.label, name, v, max
            )));
        }
        Ok(v)
    }
}

fn arity_text(arity: &[usize]) -> String {
    arity
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

pub fn wire_type(value: &WireValue) -> &'static str {
    match value {
        WireValue::Nil => "nil",
        WireValue::Int(_) => "integer",
        WireValue::Float(_) => "float",
        WireValue::String(_) => "string",
        WireValue::Bool(_) => "bool",
        WireValue::Blob(_) => "blob",
        WireValue::List(_) => "list",
        WireValue::Map(_) => "map",
        WireValue::Json(_) => "json",
        WireValue::Geo(_) => "geojson",
        WireValue::Hll(_) => "hll",
        WireValue::Wildcard => "wildcard",
        WireValue::Infinity => "infinity",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: Vec<WireValue>, arity: &[usize]) -> ProxyResult<Args> {
        Args::new("test op".to_string(), values, arity)
    }

    #[test]
    fn test_arity_checked_up_front() {
        let err = args(vec![WireValue::Int(1)], &[2]).err().unwrap();
        assert!(matches!(err, ProxyError::Protocol(ref m) if m.contains("expects 2")));

        assert!(args(vec![], &[0, 1]).is_ok());
        assert!(args(vec![WireValue::Int(1)], &[0, 1]).is_ok());
    }

    #[test]
    fn test_wrong_variant_is_protocol_error() {
        let mut a = args(vec![WireValue::String("x".into())], &[1]).unwrap();
        let err = a.int("index").unwrap_err();
        assert!(matches!(err, ProxyError::Protocol(ref m) if m.contains("index")));
    }

    #[test]
    fn test_narrowing_is_validation_error() {
        let mut a = args(vec![WireValue::Int(i64::from(i32::MAX) + 1)], &[1]).unwrap();
        assert!(matches!(a.index("index"), Err(ProxyError::Validation(_))));

        let mut a = args(vec![WireValue::Int(-1)], &[1]).unwrap();
        assert!(matches!(a.count("count"), Err(ProxyError::Validation(_))));

        let mut a = args(vec![WireValue::Int(i64::from(u32::MAX))], &[1]).unwrap();
        assert_eq!(a.count("count").unwrap(), u32::MAX);
    }

    #[test]
    fn test_hll_bits() {
        let mut a = args(vec![WireValue::Int(-1), WireValue::Int(-2)], &[2]).unwrap();
        assert_eq!(a.bits("index_bits").unwrap(), -1);
        assert!(matches!(a.bits("min_hash_bits"), Err(ProxyError::Validation(_))));

        let mut a = args(vec![WireValue::Int(200)], &[1]).unwrap();
        assert!(matches!(a.bits("index_bits"), Err(ProxyError::Validation(_))));
    }

    #[test]
    fn test_flags_range() {
        let mut a = args(vec![WireValue::Int(3), WireValue::Int(8)], &[2]).unwrap();
        assert_eq!(a.flags("sort", 3).unwrap(), 3);
        assert!(matches!(a.flags("resize", 7), Err(ProxyError::Validation(_))));
    }

    #[test]
    fn test_hll_list_rejects_other_values() {
        let mut a = args(
            vec![WireValue::List(vec![WireValue::Hll(vec![1]), WireValue::Int(2)])],
            &[1],
        )
        .unwrap();
        assert!(matches!(a.hll_list("hlls"), Err(ProxyError::Protocol(_))));

        let mut a = args(
            vec![WireValue::List(vec![WireValue::Hll(vec![1]), WireValue::Hll(vec![2])])],
            &[1],
        )
        .unwrap();
        assert_eq!(a.hll_list("hlls").unwrap(), vec![vec![1], vec![2]]);
    }
}
