//! Purpose: Single MessagePack decode/encode seam for the corpus tooling.
//! Exports: `decode_value`, `encode_json`, `DecodeFailure`.
//! Role: Keeps `rmpv`/`rmp-serde` details out of the checker and generator.
//! Invariants: A buffer decodes only if it holds exactly one value; leftover bytes fail.
//! Invariants: Decode failures are values, never fatal errors.
//! Invariants: Nesting is capped at `MAX_DECODE_DEPTH` so decoding fits a 2 MB thread stack.
use std::error::Error as StdError;
use std::fmt;

use rmpv::Value;

use crate::core::error::{Error, ErrorKind};

/// Deepest array/map nesting accepted before a buffer is reported as malformed.
pub const MAX_DECODE_DEPTH: usize = 256;

/// Why a byte buffer is not a single well-formed MessagePack value.
#[derive(Debug)]
pub enum DecodeFailure {
    Malformed(rmpv::decode::Error),
    TrailingBytes { consumed: usize, total: usize },
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Malformed(err) => write!(f, "{err}"),
            DecodeFailure::TrailingBytes { consumed, total } => write!(
                f,
                "extra data: value ends at byte {consumed} of {total} ({} trailing)",
                total - consumed
            ),
        }
    }
}

impl StdError for DecodeFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DecodeFailure::Malformed(err) => Some(err),
            DecodeFailure::TrailingBytes { .. } => None,
        }
    }
}

pub fn decode_value(bytes: &[u8]) -> Result<Value, DecodeFailure> {
    let mut rest = bytes;
    let value = rmpv::decode::read_value_with_max_depth(&mut rest, MAX_DECODE_DEPTH)
        .map_err(DecodeFailure::Malformed)?;
    if !rest.is_empty() {
        return Err(DecodeFailure::TrailingBytes {
            consumed: bytes.len() - rest.len(),
            total: bytes.len(),
        });
    }
    Ok(value)
}

/// Encodes a JSON document as MessagePack; objects become string-keyed maps.
pub fn encode_json(value: &serde_json::Value) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec_named(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode json as msgpack")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{DecodeFailure, MAX_DECODE_DEPTH, decode_value, encode_json};
    use serde_json::json;

    #[test]
    fn decodes_positive_fixint() {
        let value = decode_value(&[0x2a]).expect("decode");
        assert_eq!(value.as_u64(), Some(42));
    }

    #[test]
    fn decodes_nested_map() {
        // {"k": [1, "x"]}
        let bytes = [0x81, 0xa1, b'k', 0x92, 0x01, 0xa1, b'x'];
        let value = decode_value(&bytes).expect("decode");
        let map = value.as_map().expect("map");
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].0.as_str(), Some("k"));
        assert_eq!(map[0].1.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = decode_value(&[]).unwrap_err();
        assert!(matches!(err, DecodeFailure::Malformed(_)));
    }

    #[test]
    fn truncated_array_is_malformed() {
        let err = decode_value(&[0x92, 0x01]).unwrap_err();
        assert!(matches!(err, DecodeFailure::Malformed(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn truncated_string_is_malformed() {
        let err = decode_value(&[0xa5, b'h', b'i']).unwrap_err();
        assert!(matches!(err, DecodeFailure::Malformed(_)));
    }

    fn nested_arrays(depth: usize) -> Vec<u8> {
        let mut bytes = vec![0x91; depth];
        bytes.push(0xc0);
        bytes
    }

    #[test]
    fn nesting_within_limit_decodes() {
        let value = decode_value(&nested_arrays(MAX_DECODE_DEPTH / 2)).expect("decode");
        assert!(value.is_array());
    }

    #[test]
    fn deep_nesting_is_malformed() {
        let err = decode_value(&nested_arrays(1100)).unwrap_err();
        assert!(matches!(
            err,
            DecodeFailure::Malformed(rmpv::decode::Error::DepthLimitExceeded)
        ));
        assert!(err.to_string().contains("depth limit exceeded"));
    }

    #[test]
    fn trailing_bytes_fail() {
        let err = decode_value(&[0x2a, 0x2a, 0xc0]).unwrap_err();
        match err {
            DecodeFailure::TrailingBytes { consumed, total } => {
                assert_eq!(consumed, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected failure: {other}"),
        }
        let err = decode_value(&[0x2a, 0x00]).unwrap_err();
        assert!(err.to_string().contains("1 trailing"));
    }

    #[test]
    fn encodes_json_with_compact_integers() {
        assert_eq!(encode_json(&json!(42)).expect("encode"), vec![0x2a]);
        assert_eq!(
            encode_json(&json!({"a": 1})).expect("encode"),
            vec![0x81, 0xa1, b'a', 0x01]
        );
    }

    #[test]
    fn encoded_json_decodes() {
        let doc = json!({
            "actor": "7b7723af",
            "seq": 1,
            "ops": [{"action": "set", "value": -3.5, "flag": null}],
        });
        let bytes = encode_json(&doc).expect("encode");
        let value = decode_value(&bytes).expect("decode");
        assert_eq!(value.as_map().map(Vec::len), Some(3));
    }
}
