//! XML codec shim.
//!
//! Maps an XML document onto the nested-mapping model: an element with
//! child elements becomes a map, an element with only text becomes a
//! string, repeated sibling names collect into an array. The root element
//! is a plain wrapper (emitted as `<config>` on marshal). Attributes,
//! comments, and mixed content are dropped; this is documented behavior.

use std::io::Write;

use anyhow::{Result, anyhow};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::Format;
use crate::config::{Map, Value};

/// XML codec backed by `quick-xml` event streaming.
#[derive(Debug, Default)]
pub struct XmlFormat;

impl Format for XmlFormat {
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<(String, Map)> = Vec::new();
        let mut pending_text: Option<String> = None;
        let mut root: Option<Map> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    stack.push((name, Map::new()));
                    pending_text = None;
                }
                Event::Text(text) => {
                    pending_text = Some(text.unescape()?.into_owned());
                }
                Event::End(_) => {
                    let (name, children) = stack
                        .pop()
                        .ok_or_else(|| anyhow!("unbalanced XML end tag"))?;
                    let value = if children.is_empty() {
                        Value::String(pending_text.take().unwrap_or_default())
                    } else {
                        Value::Map(children)
                    };
                    match stack.last_mut() {
                        Some((_, parent)) => insert_or_append(parent, name, value),
                        None => {
                            root = Some(match value {
                                Value::Map(map) => map,
                                other => {
                                    let mut map = Map::new();
                                    map.insert(name, other);
                                    map
                                }
                            });
                        }
                    }
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                    match stack.last_mut() {
                        Some((_, parent)) => {
                            insert_or_append(parent, name, Value::String(String::new()));
                        }
                        None => root = Some(Map::new()),
                    }
                }
                Event::Eof => break,
                // Declarations, comments, and processing instructions are dropped.
                _ => {}
            }
            buf.clear();
        }

        Ok(root.unwrap_or_default())
    }

    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()> {
        let mut writer = Writer::new_with_indent(&mut *out, b' ', 2);
        writer.write_event(Event::Start(BytesStart::new("config")))?;
        write_map(&mut writer, data)?;
        writer.write_event(Event::End(BytesEnd::new("config")))?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Insert a value, turning repeated sibling names into an array.
fn insert_or_append(parent: &mut Map, name: String, value: Value) {
    use std::collections::btree_map::Entry;

    match parent.entry(name) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Value::Array(items) => items.push(value),
            existing => {
                let first = std::mem::replace(existing, Value::Null);
                *existing = Value::Array(vec![first, value]);
            }
        },
    }
}

fn write_map<W: Write>(writer: &mut Writer<W>, map: &Map) -> Result<()> {
    for (key, value) in map {
        write_value(writer, key, value)?;
    }
    Ok(())
}

fn write_value<W: Write>(writer: &mut Writer<W>, key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Deleted => {}
        Value::Map(map) => {
            writer.write_event(Event::Start(BytesStart::new(key)))?;
            write_map(writer, map)?;
            writer.write_event(Event::End(BytesEnd::new(key)))?;
        }
        Value::Array(items) => {
            for item in items {
                write_value(writer, key, item)?;
            }
        }
        other => {
            writer.write_event(Event::Start(BytesStart::new(key)))?;
            writer.write_event(Event::Text(BytesText::new(&other.to_display_string())))?;
            writer.write_event(Event::End(BytesEnd::new(key)))?;
        }
    }
    Ok(())
}
