//! Structural diff between current and desired state.
//!
//! Nested mappings are flattened into dotted paths before comparison so
//! that the diff output reads as `section.key = old → new`. Sentinel
//! values are leaves: they describe how a key is emitted, not nested
//! structure.

use std::collections::BTreeMap;

use crate::color::ColorSupport;
use crate::config::{Map, Value};

/// A before/after value pair for a modified key.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffValue {
    pub old: Value,
    pub new: Value,
}

/// The difference between desired and current state for one target.
///
/// `changes` carries every affected key in one mapping: added values,
/// modified new values, *and* the old values of removed keys — the
/// `generate` command consumes removed-key old values from there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    pub target: String,
    pub changes: BTreeMap<String, Value>,
    pub added: BTreeMap<String, Value>,
    pub modified: BTreeMap<String, DiffValue>,
    pub removed: Vec<String>,
}

impl Diff {
    /// True when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.removed.is_empty()
    }

    /// Render the diff with Add/Change/Remove sections.
    #[must_use]
    pub fn format(&self, colors: &ColorSupport) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut parts = Vec::new();

        if !self.added.is_empty() {
            parts.push(colors.bold("  Add:"));
            for (key, value) in &self.added {
                let line = format!("    + {key} = {}", format_value(value, "    "));
                parts.push(colors.green(&line));
            }
        }

        if !self.modified.is_empty() {
            parts.push(colors.bold("  Change:"));
            for (key, diff_value) in &self.modified {
                let old = format_value(&diff_value.old, "    ");
                let new = format_value(&diff_value.new, "    ");
                let line = format!(
                    "    ~ {key} = {} → {}",
                    colors.red(&old),
                    colors.green(&new)
                );
                parts.push(colors.yellow(&line));
            }
        }

        if !self.removed.is_empty() {
            parts.push(colors.bold("  Remove:"));
            for key in &self.removed {
                parts.push(colors.red(&format!("    - {key}")));
            }
        }

        parts.join("\n")
    }

    /// Render the diff without colors.
    #[must_use]
    pub fn format_plain(&self) -> String {
        self.format(&ColorSupport::disabled())
    }
}

/// Compare two *flat* mappings.
#[must_use]
pub fn compute_diff(current: &Map, desired: &Map) -> Diff {
    let mut diff = Diff::default();

    for (key, new_value) in desired {
        match current.get(key) {
            Some(old_value) => {
                if old_value != new_value {
                    diff.changes.insert(key.clone(), new_value.clone());
                    diff.modified.insert(
                        key.clone(),
                        DiffValue {
                            old: old_value.clone(),
                            new: new_value.clone(),
                        },
                    );
                }
            }
            None => {
                diff.changes.insert(key.clone(), new_value.clone());
                diff.added.insert(key.clone(), new_value.clone());
            }
        }
    }

    for (key, old_value) in current {
        if !desired.contains_key(key) {
            diff.removed.push(key.clone());
            diff.changes.insert(key.clone(), old_value.clone());
        }
    }

    diff
}

/// Flatten nested mappings into dotted paths (`section.key`, `a.b.c`).
///
/// Sentinel variants — and mappings still carrying a raw sentinel key —
/// are treated as leaves.
#[must_use]
pub fn flatten_for_diff(data: &Map, prefix: &str) -> Map {
    let mut result = Map::new();
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Map(nested) if !has_sentinel_key(nested) => {
                result.extend(flatten_for_diff(nested, &full_key));
            }
            other => {
                result.insert(full_key, other.clone());
            }
        }
    }
    result
}

fn has_sentinel_key(map: &Map) -> bool {
    map.contains_key("deleted") || map.contains_key("commented") || map.contains_key("value")
}

/// Flatten both sides and compare. Deletion sentinels are stripped from
/// the desired side first so the keys they name surface only as removals.
#[must_use]
pub fn compute_flat_diff(current: &Map, desired: &Map) -> Diff {
    let flat_current = flatten_for_diff(current, "");
    let mut flat_desired = flatten_for_diff(desired, "");
    flat_desired.retain(|_, value| !value.is_deleted());
    compute_diff(&flat_current, &flat_desired)
}

/// Render a value for diff display: strings quoted, null spelled out,
/// arrays one item per line, everything else as JSON.
fn format_value(value: &Value, indent: &str) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Null => "null".to_string(),
        Value::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }
            let mut parts = Vec::new();
            for item in items {
                parts.push(format!(
                    "{indent}  - {}",
                    format_value(item, &format!("{indent}  "))
                ));
            }
            format!("[\n{}\n{indent}]", parts.join("\n"))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Map {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identical_maps_produce_empty_diff() {
        let m = map(&[("a", Value::from("1")), ("b", Value::from("2"))]);
        assert!(compute_flat_diff(&m, &m).is_empty());
    }

    #[test]
    fn added_key_is_classified() {
        let current = map(&[("a", Value::from("1"))]);
        let desired = map(&[("a", Value::from("1")), ("b", Value::from("2"))]);
        let diff = compute_flat_diff(&current, &desired);
        assert!(!diff.is_empty());
        assert_eq!(diff.added["b"], Value::from("2"));
        assert!(diff.modified.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn modified_key_carries_old_and_new() {
        let current = map(&[("a", Value::from("1"))]);
        let desired = map(&[("a", Value::from("9"))]);
        let diff = compute_flat_diff(&current, &desired);
        assert_eq!(diff.modified["a"].old, Value::from("1"));
        assert_eq!(diff.modified["a"].new, Value::from("9"));
        assert_eq!(diff.changes["a"], Value::from("9"));
    }

    #[test]
    fn empty_desired_removes_every_leaf() {
        let current = map(&[
            ("a", Value::from("1")),
            (
                "section",
                Value::Map(map(&[("k", Value::from("v"))])),
            ),
        ]);
        let diff = compute_flat_diff(&current, &Map::new());
        assert!(!diff.is_empty());
        assert_eq!(diff.removed, vec!["a".to_string(), "section.k".to_string()]);
        // Removed old values surface in changes for the generate command.
        assert_eq!(diff.changes["a"], Value::from("1"));
        assert_eq!(diff.changes["section.k"], Value::from("v"));
    }

    #[test]
    fn both_empty_is_empty() {
        assert!(compute_flat_diff(&Map::new(), &Map::new()).is_empty());
    }

    #[test]
    fn deleted_sentinel_surfaces_as_removal_only() {
        let current = map(&[("x", Value::from("1")), ("y", Value::from("2"))]);
        let desired = map(&[("x", Value::Deleted), ("y", Value::from("2"))]);
        let diff = compute_flat_diff(&current, &desired);
        assert_eq!(diff.removed, vec!["x".to_string()]);
        assert!(diff.added.is_empty());
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn nested_maps_flatten_to_dotted_paths() {
        let data = map(&[(
            "a",
            Value::Map(map(&[(
                "b",
                Value::Map(map(&[("c", Value::from("leaf"))])),
            )])),
        )]);
        let flat = flatten_for_diff(&data, "");
        assert_eq!(flat["a.b.c"], Value::from("leaf"));
    }

    #[test]
    fn sentinel_variants_stay_leaves() {
        let data = map(&[(
            "key",
            Value::Commented {
                prefix: "; ".to_string(),
                value: Some(Box::new(Value::from("x"))),
            },
        )]);
        let flat = flatten_for_diff(&data, "");
        assert!(
            matches!(flat["key"], Value::Commented { .. }),
            "sentinel should not flatten further"
        );
    }

    #[test]
    fn raw_sentinel_keyed_map_stays_a_leaf() {
        let inner = map(&[("deleted", Value::Bool(false)), ("other", Value::from("x"))]);
        let data = map(&[("key", Value::Map(inner.clone()))]);
        let flat = flatten_for_diff(&data, "");
        assert_eq!(flat["key"], Value::Map(inner));
    }

    #[test]
    fn nested_map_vs_leaf_is_a_modification() {
        let current = map(&[("a", Value::from("scalar"))]);
        let desired = map(&[("a", Value::Wrapped(Box::new(Value::from("scalar"))))]);
        let diff = compute_flat_diff(&current, &desired);
        assert!(diff.modified.contains_key("a"));
    }

    #[test]
    fn format_plain_lists_all_sections() {
        let current = map(&[("old", Value::from("1")), ("mod", Value::from("a"))]);
        let desired = map(&[("mod", Value::from("b")), ("new", Value::from("2"))]);
        let diff = compute_flat_diff(&current, &desired);
        let text = diff.format_plain();
        assert!(text.contains("Add:"), "{text}");
        assert!(text.contains("+ new = \"2\""), "{text}");
        assert!(text.contains("Change:"), "{text}");
        assert!(text.contains("~ mod = \"a\" → \"b\""), "{text}");
        assert!(text.contains("Remove:"), "{text}");
        assert!(text.contains("- old"), "{text}");
    }

    #[test]
    fn empty_diff_formats_to_nothing() {
        assert_eq!(Diff::default().format_plain(), "");
    }
}
