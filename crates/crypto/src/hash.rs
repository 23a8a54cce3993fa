//! SHA-256 content hashing.
//!
//! Strings are hashed as-is. JSON objects are hashed over the same text
//! Python's `json.dumps(data, sort_keys=True)` produces, so hashes computed
//! by the ingestion scripts and by this service agree byte for byte.

use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::io;

use crate::{CryptoError, Result};

/// Render the value that gets hashed
pub fn prepare_data(data: &Value) -> Result<String> {
    match data {
        Value::String(text) => Ok(text.clone()),
        Value::Object(_) => {
            let sorted = sort_keys(data);
            let mut out = Vec::new();
            let mut serializer = Serializer::with_formatter(&mut out, PythonFormatter);
            serde::Serialize::serialize(&sorted, &mut serializer)
                .map_err(|e| CryptoError::Hash(e.to_string()))?;
            String::from_utf8(out).map_err(|e| CryptoError::Hash(e.to_string()))
        }
        _ => Err(CryptoError::Hash(
            "Data must be either a string or a JSON object".to_string(),
        )),
    }
}

pub fn hash_data(data: &Value) -> Result<[u8; 32]> {
    let prepared = prepare_data(data)?;
    Ok(Sha256::digest(prepared.as_bytes()).into())
}

pub fn hash_hex(data: &Value) -> Result<String> {
    Ok(hex::encode(hash_data(data)?))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, item) in entries {
                sorted.insert(key.clone(), sort_keys(item));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Matches `json.dumps` defaults: `", "` / `": "` separators and `ensure_ascii`
struct PythonFormatter;

impl Formatter for PythonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_hash() {
        assert_eq!(
            hash_hex(&json!("hello world")).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_object_hash_matches_python() {
        assert_eq!(
            hash_hex(&json!({"name": "John", "age": 19})).unwrap(),
            "46d18cfdf6917e1039e2151c89710763b7b9b39d4329848aab7d17b4857bcfc2"
        );
    }

    #[test]
    fn test_python_rendering() {
        let data = json!({"z": "é", "resourceType": "Patient", "n": [1, 2], "id": "r1"});
        assert_eq!(
            prepare_data(&data).unwrap(),
            r#"{"id": "r1", "n": [1, 2], "resourceType": "Patient", "z": "\u00e9"}"#
        );
        assert_eq!(
            hash_hex(&data).unwrap(),
            "634d7879e3983b19513dd21571d4e24f0168484bbe88cca7066be363f0358937"
        );
    }

    #[test]
    fn test_nested_keys_sorted() {
        let data = json!({"b": {"y": 1, "x": [{"q": 1, "p": 2}]}, "a": null});
        assert_eq!(
            prepare_data(&data).unwrap(),
            r#"{"a": null, "b": {"x": [{"p": 2, "q": 1}], "y": 1}}"#
        );
    }

    #[test]
    fn test_astral_character_uses_surrogates() {
        assert_eq!(
            prepare_data(&json!({"k": "😀"})).unwrap(),
            r#"{"k": "\ud83d\ude00"}"#
        );
    }

    #[test]
    fn test_rejects_other_types() {
        assert!(hash_hex(&json!(42)).is_err());
        assert!(hash_hex(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_sha256_hex_bytes() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
