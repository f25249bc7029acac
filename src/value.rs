//! Structural merge for JSON objects
//!
//! Precedence is fixed: the overlay wins over the base, nested objects merge
//! key by key, and every other value (arrays included) replaces wholesale.

use serde_json::{Map, Value};

/// Merge `overlay` into `base` in place
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, incoming) in overlay {
        match (base.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                deep_merge(existing, nested);
            }
            _ => {
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Merge `overlay` over a copy of `base`
pub fn merged(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    deep_merge(&mut out, overlay);
    out
}

/// Read an integer at `object[outer][inner]`
pub(crate) fn nested_i64(object: &Map<String, Value>, outer: &str, inner: &str) -> Option<i64> {
    object.get(outer)?.get(inner)?.as_i64()
}
