//! TOML codec shim.

use std::io::Write;

use anyhow::{Context as _, Result};

use super::Format;
use crate::config::Map;

/// TOML codec backed by the `toml` crate. Comments are lost on rewrite.
#[derive(Debug, Default)]
pub struct TomlFormat;

impl Format for TomlFormat {
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map> {
        let text = std::str::from_utf8(data).context("TOML data is not valid UTF-8")?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        ::toml::from_str(text).context("parse TOML")
    }

    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()> {
        let text = ::toml::to_string_pretty(data).context("serialize TOML")?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Value;

    #[test]
    fn unmarshal_nested_tables() {
        let mut format = TomlFormat;
        let map = format
            .unmarshal(b"[server]\nport = \"80\"\n")
            .expect("valid TOML should parse");
        let server = map["server"].as_map().unwrap();
        assert_eq!(server["port"], Value::String("80".to_string()));
    }

    #[test]
    fn empty_input_is_an_empty_map() {
        let mut format = TomlFormat;
        assert!(format.unmarshal(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn marshal_round_trips() {
        let mut format = TomlFormat;
        let map = format.unmarshal(b"[a]\nk = \"v\"\n").unwrap();
        let mut out = Vec::new();
        format.marshal(&map, &mut out).unwrap();
        let reparsed = format.unmarshal(&out).unwrap();
        assert_eq!(reparsed, map);
    }

    #[test]
    fn invalid_toml_errors() {
        let mut format = TomlFormat;
        assert!(format.unmarshal(b"= broken").is_err());
    }
}
