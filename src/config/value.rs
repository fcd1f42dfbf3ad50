//! Dynamic configuration values.
//!
//! Desired state, current state, and diff payloads are all nested mappings
//! of strings to [`Value`]. Sentinel shapes from the configuration language
//! (`{deleted = true}`, `{commented = "; ", value = "x"}`, `{value = "x"}`)
//! are lifted into dedicated variants at decode time so that the diff and
//! merge engines can pattern-match instead of probing map keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A nested string-keyed mapping of configuration values.
///
/// `BTreeMap` keeps iteration deterministic wherever the engine emits maps
/// in iteration order (from-scratch INI serialization, generated documents).
pub type Map = BTreeMap<String, Value>;

/// A configuration value.
///
/// # Examples
///
/// ```
/// use confsync::config::Value;
///
/// let v: Value = toml::from_str::<toml::Table>("x = { deleted = true }")
///     .unwrap()
///     .remove("x")
///     .map(|t| t.try_into().unwrap())
///     .unwrap();
/// assert_eq!(v, Value::Deleted);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null (YAML/JSON); TOML cannot represent it.
    Null,
    /// A string scalar.
    String(String),
    /// A boolean scalar.
    Bool(bool),
    /// An integer scalar.
    Integer(i64),
    /// A floating-point scalar.
    Float(f64),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// A nested mapping.
    Map(Map),
    /// Sentinel: remove this key from the target.
    Deleted,
    /// Sentinel: the key exists in commented-out form, with the comment
    /// prefix as written (e.g. `"; "`) and an optional underlying value.
    Commented {
        prefix: String,
        value: Option<Box<Value>>,
    },
    /// Sentinel: a value wrapper carrying emission detail, compared as a leaf.
    Wrapped(Box<Value>),
}

impl Value {
    /// Return the string content if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the nested map if this is a mapping.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this value is one of the sentinel variants (`deleted`,
    /// `commented`, `value` wrapper). Sentinels are leaves for flattening
    /// and diffing even though they were written as maps.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        matches!(
            self,
            Self::Deleted | Self::Commented { .. } | Self::Wrapped(_)
        )
    }

    /// Whether this value is the deletion sentinel.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Render the value the way external tools expect it on a command line
    /// (dconf quoting, sed state comparison). Scalars render bare; composite
    /// values fall back to their JSON representation.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            other => serde_json::to_string(&other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

/// Recursively merge `incoming` into `existing`.
///
/// For each incoming key: when both sides hold maps the merge recurses,
/// otherwise the incoming value overwrites. Keys only present in `existing`
/// are preserved — this is what keeps unmanaged keys intact when desired
/// content is merged into a file's current state.
pub fn deep_merge(existing: &mut Map, incoming: Map) {
    use std::collections::btree_map::Entry;

    for (key, new_value) in incoming {
        match existing.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(new_value);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), new_value) {
                (Value::Map(existing_map), Value::Map(new_map)) => {
                    deep_merge(existing_map, new_map);
                }
                (slot_value, new_value) => *slot_value = new_value,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

/// The wire shape of a value before sentinel maps are lifted into variants.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawValue {
    Null(()),
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Null(()) => Self::Null,
            RawValue::Bool(b) => Self::Bool(b),
            RawValue::Integer(i) => Self::Integer(i),
            RawValue::Float(f) => Self::Float(f),
            RawValue::String(s) => Self::String(s),
            RawValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            RawValue::Map(map) => lift_sentinels(map),
        }
    }
}

/// Recognize the sentinel map shapes and lift them into their variants;
/// anything else stays a plain mapping.
fn lift_sentinels(mut map: BTreeMap<String, RawValue>) -> Value {
    if matches!(map.get("deleted"), Some(RawValue::Bool(true))) {
        return Value::Deleted;
    }

    if map.contains_key("commented") {
        let prefix = match map.remove("commented") {
            Some(RawValue::String(s)) => s,
            _ => "# ".to_string(),
        };
        let value = map.remove("value").map(|v| Box::new(Value::from(v)));
        return Value::Commented { prefix, value };
    }

    if map.len() == 1
        && let Some(inner) = map.remove("value")
    {
        return Value::Wrapped(Box::new(Value::from(inner)));
    }

    Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawValue::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Self::Deleted => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("deleted", &true)?;
                out.end()
            }
            Self::Commented { prefix, value } => {
                let len = if value.is_some() { 2 } else { 1 };
                let mut out = serializer.serialize_map(Some(len))?;
                out.serialize_entry("commented", prefix)?;
                if let Some(value) = value {
                    out.serialize_entry("value", value)?;
                }
                out.end()
            }
            Self::Wrapped(inner) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("value", inner)?;
                out.end()
            }
        }
    }
}
