//! Content hashing for source documents.
//!
//! An artifact's `contentHash` must be a deterministic consequence of the
//! source document, not of how a particular parser happened to order its
//! keys. Documents are therefore rendered canonically before hashing:
//! object keys sorted bytewise at every depth, no insignificant whitespace,
//! scalars written exactly as `serde_json` writes them.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a JSON value canonically.
///
/// # Example
/// ```
/// use banyan_foundation::content_hash::canonical_json;
///
/// let doc = serde_json::json!({ "b": 1, "a": [true, null] });
/// assert_eq!(canonical_json(&doc), r#"{"a":[true,null],"b":1}"#);
/// ```
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hex-encoded SHA-256 of the canonical rendering of `value`.
pub fn content_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}
