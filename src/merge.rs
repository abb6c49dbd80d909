//! Merging `$ref` sibling keys onto resolved targets.

use serde_json::Value;

use crate::types::REQUIRED_KEY;

/// Deep-merge `overlay` onto `base`.
///
/// - object + object: keys are merged one by one, nested objects recursively
/// - `required` lists are unioned when `merge_required` is set (base order
///   first, then new overlay entries)
/// - everything else: overlay replaces base
pub fn deep_merge(base: Value, overlay: &Value, merge_required: bool) -> Value {
    let (Value::Object(mut out), Value::Object(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    for (key, value) in overlay_map {
        // Merge in place so base keys keep their position.
        let Some(slot) = out.get_mut(key) else {
            out.insert(key.clone(), value.clone());
            continue;
        };
        *slot = match std::mem::take(slot) {
            existing @ Value::Object(_) if value.is_object() => {
                deep_merge(existing, value, merge_required)
            }
            Value::Array(existing) if merge_required && key == REQUIRED_KEY && value.is_array() => {
                Value::Array(union_preserving_order(existing, value))
            }
            _ => value.clone(),
        };
    }
    Value::Object(out)
}

fn union_preserving_order(mut base: Vec<Value>, overlay: &Value) -> Vec<Value> {
    if let Value::Array(items) = overlay {
        for item in items {
            if !base.contains(item) {
                base.push(item.clone());
            }
        }
    }
    base
}
