//! YAML codec shim.

use std::io::Write;

use anyhow::{Context as _, Result};

use super::Format;
use crate::config::Map;

/// YAML codec backed by `serde_yaml`. Comments are lost on rewrite.
#[derive(Debug, Default)]
pub struct YamlFormat;

impl Format for YamlFormat {
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        serde_yaml::from_slice(data).context("parse YAML")
    }

    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()> {
        serde_yaml::to_writer(out, data).context("serialize YAML")
    }
}
