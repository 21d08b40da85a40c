//! Canonical hashing for ledger blocks
//!
//! A block is hashed by serializing its fields as a JSON object whose keys
//! are sorted lexicographically at every nesting level, then taking the
//! SHA-256 digest of the UTF-8 bytes. The output is lowercase hex.

use crate::error::{LedgerError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 over arbitrary bytes, returned as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Rebuild a JSON value with every object's keys in sorted order.
///
/// Inserting in sorted order keeps the result canonical whether or not
/// `serde_json` is built with `preserve_order`.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize a field mapping into its canonical compact JSON form.
pub fn canonical_json<T: Serialize + ?Sized>(fields: &T) -> Result<String> {
    let value = serde_json::to_value(fields)?;
    if !value.is_object() {
        return Err(LedgerError::Serialization(
            "canonical form requires a key-value mapping".to_string(),
        ));
    }
    Ok(serde_json::to_string(&canonicalize(value))?)
}

/// Digest of the canonical serialization of `fields`.
pub fn digest<T: Serialize + ?Sized>(fields: &T) -> Result<String> {
    let json = canonical_json(fields)?;
    Ok(sha256_hex(json.as_bytes()))
}

/// Returns true if `s` looks like a digest produced by this module.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
