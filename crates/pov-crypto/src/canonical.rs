//! Deterministic JSON encoding.
//!
//! The output is compact JSON with object keys sorted by their UTF-8 bytes at
//! every nesting level. Arrays keep their order. Numbers use `serde_json`'s
//! own formatting: integers in plain decimal, floats in the shortest
//! representation that round-trips (ryu), which does not depend on the
//! platform or locale.

use serde::Serialize;
use serde_json::Value;

/// Errors from canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The value cannot be expressed as a mapping, sequence, string,
    /// number, boolean, or null.
    #[error("value outside the canonical model: {0}")]
    Unsupported(String),

    /// A float field that must be finite was NaN or infinite.
    #[error("non-finite number in field `{0}`")]
    NonFinite(&'static str),

    /// Input text is not JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// An integer literal does not fit in 64 bits and would be rounded.
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOverflow(String),
}

/// Parse JSON text into the value model without silent rounding.
///
/// `serde_json` reads integer literals beyond the `i64`/`u64` range as
/// floats, which would quietly change the value before it is hashed. Such
/// literals are refused instead. Float literals are kept as parsed.
pub fn parse_exact(text: &[u8]) -> Result<Value, EncodingError> {
    let value: Value =
        serde_json::from_slice(text).map_err(|e| EncodingError::InvalidJson(e.to_string()))?;
    if let Some(literal) = oversized_integer(text) {
        return Err(EncodingError::IntegerOverflow(literal));
    }
    Ok(value)
}

/// First integer literal outside string values that overflows 64 bits.
/// Only called on text that already parsed as JSON.
fn oversized_integer(text: &[u8]) -> Option<String> {
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < text.len() {
        let b = text[i];
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                i += 1;
            }
            b'-' | b'0'..=b'9' => {
                let start = i;
                while i < text.len() && matches!(text[i], b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') {
                    i += 1;
                }
                let literal = std::str::from_utf8(&text[start..i]).unwrap_or_default();
                let integral = !literal.contains(['.', 'e', 'E']);
                if integral && literal.parse::<i64>().is_err() && literal.parse::<u64>().is_err() {
                    return Some(literal.to_string());
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Encode any serializable value canonically.
///
/// The value is first lowered into the `serde_json` value model, which is
/// where unsupported shapes (maps with non-string keys, failing `Serialize`
/// impls) are rejected.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodingError> {
    let tree = serde_json::to_value(value).map_err(|e| EncodingError::Unsupported(e.to_string()))?;
    encode_value(&tree)
}

/// Encode an already-built value tree canonically.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(128);
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_str(s, out)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_str(key, out)?;
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_str(s: &str, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    serde_json::to_writer(&mut *out, s).map_err(|e| EncodingError::Unsupported(e.to_string()))
}
