//! Value codec: wire `Value` to and from the store value model.

use kvproxy_client::protocol::{JsonEntry, MapEntry, Value as WireValue};

use crate::error::{ProxyError, ProxyResult};
use crate::store::{Value, ValueMap};

/// Deepest list/map nesting accepted from the wire.
pub const MAX_VALUE_DEPTH: usize = 64;

pub fn decode_value(value: WireValue) -> ProxyResult<Value> {
    decode_at(value, 0)
}

/// Absent values decode to `Nil`.
pub fn decode_optional(value: Option<WireValue>) -> ProxyResult<Value> {
    value.map_or(Ok(Value::Nil), decode_value)
}

pub fn decode_values(values: Vec<WireValue>) -> ProxyResult<Vec<Value>> {
    values.into_iter().map(decode_value).collect()
}

fn decode_at(value: WireValue, depth: usize) -> ProxyResult<Value> {
    if depth >= MAX_VALUE_DEPTH {
        return Err(ProxyError::protocol(format!(
            "value nesting exceeds {} levels",
            MAX_VALUE_DEPTH
        )));
    }

    let decoded = match value {
        WireValue::Nil => Value::Nil,
        WireValue::Int(v) => Value::Int(v),
        WireValue::Float(v) => Value::Float(v),
        WireValue::String(v) => Value::String(v),
        WireValue::Bool(v) => Value::Bool(v),
        WireValue::Blob(v) => Value::Blob(v),
        WireValue::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| decode_at(item, depth + 1))
                .collect::<ProxyResult<_>>()?,
        ),
        WireValue::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|e| Ok((decode_at(e.k, depth + 1)?, decode_at(e.v, depth + 1)?)))
                .collect::<ProxyResult<ValueMap>>()?,
        ),
        WireValue::Json(entries) => Value::Json(
            entries
                .into_iter()
                .map(|e| Ok((e.k, decode_at(e.v, depth + 1)?)))
                .collect::<ProxyResult<_>>()?,
        ),
        WireValue::Geo(v) => Value::GeoJson(v),
        WireValue::Hll(v) => Value::Hll(v),
        WireValue::Wildcard => Value::Wildcard,
        WireValue::Infinity => Value::Infinity,
    };
    Ok(decoded)
}

pub fn encode_value(value: Value) -> WireValue {
    match value {
        Value::Nil => WireValue::Nil,
        Value::Int(v) => WireValue::Int(v),
        Value::Float(v) => WireValue::Float(v),
        Value::String(v) => WireValue::String(v),
        Value::Bool(v) => WireValue::Bool(v),
        Value::Blob(v) => WireValue::Blob(v),
        Value::List(items) => WireValue::List(items.into_iter().map(encode_value).collect()),
        Value::Map(map) => WireValue::Map(
            map.into_iter()
                .map(|(k, v)| MapEntry {
                    k: encode_value(k),
                    v: encode_value(v),
                })
                .collect(),
        ),
        Value::Json(entries) => WireValue::Json(
            entries
                .into_iter()
                .map(|(k, v)| JsonEntry {
                    k,
                    v: encode_value(v),
                })
                .collect(),
        ),
        Value::GeoJson(v) => WireValue::Geo(v),
        Value::Hll(v) => WireValue::Hll(v),
        Value::Wildcard => WireValue::Wildcard,
        Value::Infinity => WireValue::Infinity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: WireValue) -> WireValue {
        encode_value(decode_value(value).unwrap())
    }

    #[test]
    fn test_scalar_variants_roundtrip() {
        let samples = vec![
            WireValue::Nil,
            WireValue::Int(-42),
            WireValue::Float(2.5),
            WireValue::String("hello".to_string()),
            WireValue::Bool(true),
            WireValue::Blob(vec![0, 1, 255]),
            WireValue::Geo(r#"{"type":"Point","coordinates":[1,2]}"#.to_string()),
            WireValue::Hll(vec![9, 9, 9]),
            WireValue::Wildcard,
            WireValue::Infinity,
        ];
        for sample in samples {
            assert_eq!(roundtrip(sample.clone()), sample);
        }
    }

    #[test]
    fn test_nested_collections_roundtrip() {
        let value = WireValue::List(vec![
            WireValue::Int(1),
            WireValue::map(vec![(
                WireValue::String("inner".to_string()),
                WireValue::List(vec![WireValue::Nil]),
            )]),
            WireValue::Json(vec![JsonEntry {
                k: "name".to_string(),
                v: WireValue::String("x".to_string()),
            }]),
        ]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_map_order_is_not_significant() {
        let a = decode_value(WireValue::map(vec![
            (WireValue::Int(1), WireValue::from("a")),
            (WireValue::Int(2), WireValue::from("b")),
        ]))
        .unwrap();
        let b = decode_value(WireValue::map(vec![
            (WireValue::Int(2), WireValue::from("b")),
            (WireValue::Int(1), WireValue::from("a")),
        ]))
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_map_key_keeps_last() {
        let decoded = decode_value(WireValue::map(vec![
            (WireValue::from("k"), WireValue::Int(1)),
            (WireValue::from("k"), WireValue::Int(2)),
        ]))
        .unwrap();
        match decoded {
            Value::Map(map) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map.get(&Value::from("k")), Some(&Value::Int(2)));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_value_is_nil() {
        assert_eq!(decode_optional(None).unwrap(), Value::Nil);
    }

    #[test]
    fn test_nesting_limit() {
        let mut value = WireValue::Int(0);
        for _ in 0..MAX_VALUE_DEPTH {
            value = WireValue::List(vec![value]);
        }
        let err = decode_value(value).unwrap_err();
        assert!(matches!(err, ProxyError::Protocol(_)));

        let mut shallow = WireValue::Int(0);
        for _ in 0..MAX_VALUE_DEPTH - 1 {
            shallow = WireValue::List(vec![shallow]);
        }
        assert!(decode_value(shallow).is_ok());
    }
}
