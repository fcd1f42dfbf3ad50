//! File format codecs.
//!
//! Every format exposes the same two operations — parse bytes into a nested
//! [`Map`] and serialize a map back out — behind the [`Format`] trait.
//! INI is the structure-preserving codec with its own line model; the other
//! formats are thin shims over their serde libraries. Comments are lost for
//! the four non-INI formats; this is documented behavior.

pub mod ini;
mod json;
mod toml;
mod xml;
mod yaml;

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;

use crate::config::Map;

pub use self::ini::IniFormat;
pub use self::json::JsonFormat;
pub use self::toml::TomlFormat;
pub use self::xml::XmlFormat;
pub use self::yaml::YamlFormat;

/// A configuration file codec.
///
/// `unmarshal` takes `&mut self` because the INI codec caches its parsed
/// line vector between the unmarshal and the following marshal; that cache
/// is what makes structure-preserving edits possible.
pub trait Format: std::fmt::Debug {
    /// Parse raw file bytes into a nested mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid for the format.
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map>;

    /// Serialize a nested mapping into the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping cannot be represented in the format
    /// or the writer fails.
    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()>;

    /// Apply format-specific options. Formats without options ignore this.
    ///
    /// # Errors
    ///
    /// Returns an error when an option value is structurally unusable;
    /// unknown keys and wrong-typed values are tolerated silently.
    fn configure(&mut self, _options: &Map) -> Result<()> {
        Ok(())
    }
}

/// Registry of available codecs, keyed by format name.
pub struct FormatRegistry {
    factories: BTreeMap<&'static str, fn() -> Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a registry with all built-in codecs registered.
    #[must_use]
    pub fn new() -> Self {
        let mut factories: BTreeMap<&'static str, fn() -> Box<dyn Format>> = BTreeMap::new();
        factories.insert("ini", || Box::new(IniFormat::new()));
        factories.insert("yaml", || Box::new(YamlFormat));
        factories.insert("toml", || Box::new(TomlFormat));
        factories.insert("json", || Box::new(JsonFormat));
        factories.insert("xml", || Box::new(XmlFormat));
        Self { factories }
    }

    /// Construct a fresh codec instance for `format`.
    ///
    /// Each call returns a new instance so per-use codec state (the INI
    /// line cache) never leaks between targets.
    ///
    /// # Errors
    ///
    /// Returns an error naming the format when none is registered for it.
    pub fn get(&self, format: &str) -> Result<Box<dyn Format>> {
        self.factories
            .get(format)
            .map(|factory| factory())
            .ok_or_else(|| anyhow::anyhow!("no parser registered for format: {format}"))
    }

    /// Whether a codec is registered for `format`.
    #[must_use]
    pub fn has(&self, format: &str) -> bool {
        self.factories.contains_key(format)
    }

    /// All registered format names.
    #[must_use]
    pub fn formats(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
