//! JSON codec shim.

use std::io::Write;

use anyhow::{Context as _, Result};

use super::Format;
use crate::config::Map;

/// JSON codec backed by `serde_json`. Output is pretty-printed with a
/// trailing newline.
#[derive(Debug, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        serde_json::from_slice(data).context("parse JSON")
    }

    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, data).context("serialize JSON")?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Value;

    #[test]
    fn unmarshal_nested_objects() {
        let mut format = JsonFormat;
        let map = format
            .unmarshal(br#"{"server": {"port": "80", "debug": true}}"#)
            .unwrap();
        let server = map["server"].as_map().unwrap();
        assert_eq!(server["port"], Value::String("80".to_string()));
        assert_eq!(server["debug"], Value::Bool(true));
    }

    #[test]
    fn null_is_preserved() {
        let mut format = JsonFormat;
        let map = format.unmarshal(br#"{"x": null}"#).unwrap();
        assert_eq!(map["x"], Value::Null);
    }

    #[test]
    fn empty_input_is_an_empty_map() {
        let mut format = JsonFormat;
        assert!(format.unmarshal(b" ").unwrap().is_empty());
    }

    #[test]
    fn marshal_round_trips() {
        let mut format = JsonFormat;
        let map = format
            .unmarshal(br#"{"a": {"k": "v"}, "n": 3}"#)
            .unwrap();
        let mut out = Vec::new();
        format.marshal(&map, &mut out).unwrap();
        assert!(out.ends_with(b"\n"), "output should end with a newline");
        assert_eq!(format.unmarshal(&out).unwrap(), map);
    }
}
