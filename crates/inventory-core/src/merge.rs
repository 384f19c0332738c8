//! Recursive mapping merge primitive
//!
//! Every other component combines variable contributions through this one
//! function, applied left-to-right across ordered sequences so that later
//! contributions take precedence.

use serde_yaml::Value;

/// Deep merge two YAML values
///
/// If both values are mappings, merge them recursively with `overlay` taking
/// precedence. Otherwise `overlay` replaces `base` wholesale; sequences and
/// scalars are never concatenated. Keys present on only one side pass through
/// unchanged.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_map.insert(key.clone(), overlay_val.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
