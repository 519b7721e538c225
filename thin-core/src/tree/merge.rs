//! Asymmetric deep merge for nested value trees

use serde_json::Value;

/// Merge `overlay` into `base`, producing a new tree.
///
/// When both sides hold an object at the same key the two merge key-wise;
/// otherwise the overlay value replaces the base value. Keys present on only
/// one side are preserved. A non-object base only gives way to the overlay
/// when it is empty (null, `""`, `false`, or numeric zero); a genuinely-set
/// scalar base is never overridden by an overlay tree.
///
/// Merging a non-object overlay into an object base is a no-op, which is
/// what makes an absent overrides argument safe to merge anywhere.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match base {
        Value::Object(base_map) => {
            let mut merged = base_map.clone();
            if let Value::Object(overlay_map) = overlay {
                for (key, overlay_value) in overlay_map {
                    let merged_value = match (merged.get(key), overlay_value) {
                        (Some(base_value @ Value::Object(_)), Value::Object(_)) => {
                            deep_merge(base_value, overlay_value)
                        }
                        _ => overlay_value.clone(),
                    };
                    merged.insert(key.clone(), merged_value);
                }
            }
            Value::Object(merged)
        }
        _ if is_empty_scalar(base) => overlay.clone(),
        _ => base.clone(),
    }
}

/// Values the merge treats as "unset": an empty base contributes nothing and
/// is replaced by the overlay in its entirety.
fn is_empty_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        _ => false,
    }
}
