//! Managed-key filtering.
//!
//! Reading an existing file exposes every key it contains; without a
//! filter those unmanaged keys would constantly surface as drift. The
//! filter is the policy statement: the engine only manages what the user
//! mentioned in desired state.

use crate::config::{Map, Value};

use super::diff::{Diff, compute_flat_diff};

/// Filter current state down to managed keys, then diff against desired.
///
/// This is the entry point the reconciliation engine and the status
/// command both use.
#[must_use]
pub fn compute_diff_with_current(target: &str, desired: &Map, current: &Map) -> Diff {
    let filtered = filter_managed_keys(current, desired);
    let mut diff = compute_flat_diff(&filtered, desired);
    diff.target = target.to_string();
    diff
}

/// Keep only the keys of `current` that `desired` mentions, recursively.
///
/// Keys absent from `current` are omitted — the diff engine classifies
/// them as added. An INI root alias applies: keys under `current[""]` are
/// visible at the top level of the lookup, so desired content written
/// without the explicit root section still matches.
#[must_use]
pub fn filter_managed_keys(current: &Map, desired: &Map) -> Map {
    let root_section = current.get("").and_then(Value::as_map);

    let mut filtered = Map::new();
    for (key, desired_value) in desired {
        if let Some(current_value) = find_key_in_current(key, current, root_section) {
            filtered.insert(key.clone(), filter_key_value(current_value, desired_value));
        }
    }
    filtered
}

/// Look a key up directly, falling back to the root-section alias.
fn find_key_in_current<'a>(
    key: &str,
    current: &'a Map,
    root_section: Option<&'a Map>,
) -> Option<&'a Value> {
    current
        .get(key)
        .or_else(|| root_section.and_then(|root| root.get(key)))
}

/// Recurse into nested structures when both sides are maps; anything else
/// is included as-is for the diff to judge.
fn filter_key_value(current_value: &Value, desired_value: &Value) -> Value {
    if let (Value::Map(current_map), Value::Map(desired_map)) = (current_value, desired_value) {
        return Value::Map(filter_managed_keys(current_map, desired_map));
    }
    current_value.clone()
}
