//! Recursive configuration merge
//!
//! Merge semantics: maps merge key by key, recursing into nested maps;
//! any other collision is won by the overlay; keys absent from the
//! overlay are retained from the base. A `null` overlay keeps the base
//! unchanged, so optional override layers can be passed through without
//! special-casing at the call site.

use serde_json::Value;

/// Merge `overlay` into `base`, overlay winning on conflict.
///
/// Total over all JSON values: non-map overlays (arrays included)
/// replace the base value wholesale.
pub fn recursive(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (_, Value::Null) => base.clone(),
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                let entry = match base_map.get(key) {
                    Some(existing) => recursive(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Merge a chain of configuration layers, later layers overriding
/// earlier ones.
pub fn layered<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Value::Null;
    for layer in layers {
        merged = recursive(&merged, layer);
    }
    merged
}
