//! Structure-preserving INI codec.
//!
//! [`IniFormat`] presents a parsed file as a two-level mapping
//! `section -> key -> value` for editing. The line vector from the last
//! [`unmarshal`](super::Format::unmarshal) is cached so that the following
//! [`marshal`](super::Format::marshal) can apply the mapping as surgical edits:
//! untouched lines — comments, blank lines, delimiter spelling, section
//! order — re-serialize byte-for-byte.

mod line;

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;

use crate::config::{Map, Value};

pub use line::{
    IniOptions, IniParser, Line, add_key, get_value, key_exists, update_value,
};

/// INI codec with structure preservation.
#[derive(Debug, Default)]
pub struct IniFormat {
    parser: IniParser,
    lines: Vec<Line>,
}

impl IniFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line without touching the cached vector. Lets callers
    /// decode commented lines (`# key = value`) on demand, since
    /// [`unmarshal`](super::Format::unmarshal) deliberately skips them.
    #[must_use]
    pub fn parse_line(&self, raw: &str, section: &str) -> Line {
        self.parser.parse_line(raw, section)
    }

    /// Borrow the cached line vector from the last unmarshal.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// First pass of a structured update: walk the cached lines in order,
    /// dropping deleted keys, rewriting changed values, and passing
    /// everything else through untouched.
    fn update_lines(&self, data: &Map) -> Vec<Line> {
        let mut out = Vec::with_capacity(self.lines.len());
        let mut processed: BTreeSet<(String, String)> = BTreeSet::new();
        let mut current_section = String::new();

        for cached in &self.lines {
            if cached.is_section {
                current_section = cached.section.clone();
                out.push(cached.clone());
                continue;
            }

            // Non-key lines and commented lines pass through as-is; the
            // mapping never contains them.
            if cached.key.is_empty() || !cached.comment_prefix.is_empty() {
                out.push(cached.clone());
                continue;
            }

            processed.insert((current_section.clone(), cached.key.clone()));

            match find_value(data, &current_section, &cached.key) {
                // Absent from the mapping, or explicitly marked: deletion.
                None | Some(Value::Deleted) => {}
                Some(Value::String(new_value)) => {
                    let mut updated = cached.clone();
                    updated.value = new_value.clone();
                    updated.comment_prefix.clear();
                    out.push(updated);
                }
                // Sentinel wrappers and nested shapes keep the raw line.
                Some(_) => out.push(cached.clone()),
            }
        }

        let new_keys = collect_new_keys(data, &processed);
        if new_keys.is_empty() {
            out
        } else {
            insert_new_keys(out, new_keys)
        }
    }

    /// Build a line vector from scratch: root keys first, then each section
    /// header followed by its keys, in map iteration order.
    fn build_lines(data: &Map) -> Vec<Line> {
        let mut lines = Vec::new();

        if let Some(Value::Map(root)) = data.get("") {
            for (key, value) in root {
                if let Some(line) = create_line("", key, value) {
                    lines.push(line);
                }
            }
        }

        for (section, section_value) in data {
            if section.is_empty() {
                continue;
            }
            let Some(section_map) = section_value.as_map() else {
                continue;
            };
            if section_map.is_empty() {
                continue;
            }

            lines.push(Line {
                section: section.clone(),
                is_section: true,
                ..Line::default()
            });
            for (key, value) in section_map {
                if let Some(line) = create_line(section, key, value) {
                    lines.push(line);
                }
            }
        }

        lines
    }
}

impl super::Format for IniFormat {
    fn unmarshal(&mut self, data: &[u8]) -> Result<Map> {
        let text = String::from_utf8_lossy(data);
        self.lines = self.parser.parse(&text);

        let mut result = Map::new();
        for line in &self.lines {
            if !line.is_active_key() {
                continue;
            }
            let section = result
                .entry(line.section.clone())
                .or_insert_with(|| Value::Map(Map::new()));
            if let Value::Map(section_map) = section {
                section_map.insert(line.key.clone(), Value::String(line.value.clone()));
            }
        }

        Ok(result)
    }

    fn marshal(&mut self, data: &Map, out: &mut dyn Write) -> Result<()> {
        let lines = if self.lines.is_empty() {
            Self::build_lines(data)
        } else {
            self.update_lines(data)
        };
        out.write_all(self.parser.serialize(&lines).as_bytes())?;
        Ok(())
    }

    fn configure(&mut self, options: &Map) -> Result<()> {
        self.parser.options.apply(options);
        Ok(())
    }
}

/// Look up `section.key` in the two-level mapping.
fn find_value<'a>(data: &'a Map, section: &str, key: &str) -> Option<&'a Value> {
    data.get(section)?.as_map()?.get(key)
}

/// Keys present in the mapping but matched by no cached line, grouped by
/// section.
fn collect_new_keys(
    data: &Map,
    processed: &BTreeSet<(String, String)>,
) -> Vec<(String, Vec<(String, Value)>)> {
    let mut new_keys = Vec::new();
    for (section, section_value) in data {
        let Some(section_map) = section_value.as_map() else {
            continue;
        };
        let pending: Vec<(String, Value)> = section_map
            .iter()
            .filter(|(key, _)| !processed.contains(&(section.clone(), (*key).clone())))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !pending.is_empty() {
            new_keys.push((section.clone(), pending));
        }
    }
    new_keys
}

/// Second pass of a structured update: insert new keys immediately after
/// the last active key of their section; sections absent from the file get
/// a fresh header appended at the end.
fn insert_new_keys(
    lines: Vec<Line>,
    mut new_keys: Vec<(String, Vec<(String, Value)>)>,
) -> Vec<Line> {
    let mut result = Vec::with_capacity(lines.len() + new_keys.len());
    let mut current_section = String::new();

    for (i, line) in lines.iter().enumerate() {
        result.push(line.clone());

        if line.is_section {
            current_section = line.section.clone();
        }

        if let Some(pos) = new_keys.iter().position(|(s, _)| *s == current_section)
            && is_last_key_in_section(&lines, i)
        {
            let (section, keys) = new_keys.remove(pos);
            for (key, value) in keys {
                if let Some(new_line) = create_line(&section, &key, &value) {
                    result.push(new_line);
                }
            }
        }
    }

    // Sections not present in the file at all.
    for (section, keys) in new_keys {
        if !section.is_empty() {
            result.push(Line {
                section: section.clone(),
                is_section: true,
                ..Line::default()
            });
        }
        for (key, value) in keys {
            if let Some(new_line) = create_line(&section, &key, &value) {
                result.push(new_line);
            }
        }
    }

    result
}

/// Whether no further active key follows `index` before the next section
/// boundary (or end of file).
fn is_last_key_in_section(lines: &[Line], index: usize) -> bool {
    for line in &lines[index + 1..] {
        if line.is_section {
            return true;
        }
        if line.is_active_key() {
            return false;
        }
    }
    true
}

/// Construct a fresh key line, or `None` for the deletion sentinel.
/// Only string values carry text; other shapes produce a bare key.
fn create_line(section: &str, key: &str, value: &Value) -> Option<Line> {
    if value.is_deleted() {
        return None;
    }
    Some(Line {
        section: section.to_string(),
        key: key.to_string(),
        value: value.as_str().unwrap_or_default().to_string(),
        ..Line::default()
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::Format as _;
    use super::*;

    fn marshal_to_string(format: &mut IniFormat, data: &Map) -> String {
        let mut out = Vec::new();
        format.marshal(data, &mut out).expect("marshal should succeed");
        String::from_utf8(out).expect("INI output should be UTF-8")
    }

    fn section_of<'a>(map: &'a Map, name: &str) -> &'a Map {
        map[name].as_map().expect("section should be a map")
    }

    #[test]
    fn unmarshal_skips_comments_and_structure() {
        let mut format = IniFormat::new();
        let map = format
            .unmarshal(b"; a\nrootkey = rootvalue\n[options]\n; CheckSpace = x\nnew = new_value\n")
            .unwrap();

        let root = section_of(&map, "");
        assert_eq!(root["rootkey"], Value::String("rootvalue".to_string()));
        assert!(
            !root.contains_key("a"),
            "commented lines must not become keys"
        );

        let options = section_of(&map, "options");
        assert_eq!(options["new"], Value::String("new_value".to_string()));
        assert!(!options.contains_key("CheckSpace"));
    }

    #[test]
    fn unmodified_round_trip_preserves_bytes() {
        let input = "\
# header comment\n\
root = 1\n\
\n\
[database]\n\
host=oldhost\n\
port = 5432  ; inline\n";
        let mut format = IniFormat::new();
        let map = format.unmarshal(input.as_bytes()).unwrap();
        assert_eq!(marshal_to_string(&mut format, &map), input);
    }

    #[test]
    fn value_update_touches_only_the_edited_line() {
        let input = "[database]\nhost = oldhost\nport = 5432\n# legacy: host = 10.0.0.1\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(db) = map.get_mut("database").unwrap() {
            db.insert("host".to_string(), Value::String("newhost".to_string()));
        }

        assert_eq!(
            marshal_to_string(&mut format, &map),
            "[database]\nhost = newhost\nport = 5432\n# legacy: host = 10.0.0.1\n"
        );
    }

    #[test]
    fn absent_key_is_dropped() {
        let input = "[opts]\nx = 1\ny = 2\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(opts) = map.get_mut("opts").unwrap() {
            opts.remove("x");
        }

        assert_eq!(marshal_to_string(&mut format, &map), "[opts]\ny = 2\n");
    }

    #[test]
    fn deleted_sentinel_removes_the_key() {
        let input = "[opts]\nx=1\ny=2\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(opts) = map.get_mut("opts").unwrap() {
            opts.insert("x".to_string(), Value::Deleted);
        }

        assert_eq!(marshal_to_string(&mut format, &map), "[opts]\ny=2\n");
    }

    #[test]
    fn sentinel_wrapper_preserves_the_raw_line() {
        let input = "[opts]\nx = 1\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(opts) = map.get_mut("opts").unwrap() {
            opts.insert(
                "x".to_string(),
                Value::Commented {
                    prefix: "; ".to_string(),
                    value: Some(Box::new(Value::String("1".to_string()))),
                },
            );
        }

        assert_eq!(marshal_to_string(&mut format, &map), "[opts]\nx = 1\n");
    }

    #[test]
    fn new_key_lands_after_last_active_key_of_its_section() {
        let input = "[a]\nk1 = 1\n# note\n\n[b]\nk2 = 2\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(a) = map.get_mut("a").unwrap() {
            a.insert("fresh".to_string(), Value::String("x".to_string()));
        }

        assert_eq!(
            marshal_to_string(&mut format, &map),
            "[a]\nk1 = 1\nfresh = x\n# note\n\n[b]\nk2 = 2\n"
        );
    }

    #[test]
    fn new_key_respects_use_spacing_false() {
        let input = "key1=value1\n";
        let mut format = IniFormat::new();
        let mut options = Map::new();
        options.insert("use_spacing".to_string(), Value::Bool(false));
        format.configure(&options).unwrap();

        let mut map = format.unmarshal(input.as_bytes()).unwrap();
        if let Value::Map(root) = map.get_mut("").unwrap() {
            root.insert("key2".to_string(), Value::String("value2".to_string()));
        }

        assert_eq!(
            marshal_to_string(&mut format, &map),
            "key1=value1\nkey2=value2\n"
        );
    }

    #[test]
    fn unknown_section_is_appended_with_header() {
        let input = "[existing]\nk = 1\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        let mut fresh = Map::new();
        fresh.insert("new_key".to_string(), Value::String("v".to_string()));
        map.insert("brand_new".to_string(), Value::Map(fresh));

        assert_eq!(
            marshal_to_string(&mut format, &map),
            "[existing]\nk = 1\n[brand_new]\nnew_key = v\n"
        );
    }

    #[test]
    fn uncommenting_via_string_value_clears_the_prefix() {
        // A commented line is not in the unmarshal map; assigning a string
        // under the same key inserts an active line (the commented one stays).
        let input = "[s]\n# old = 1\nkeep = 2\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();

        if let Value::Map(s) = map.get_mut("s").unwrap() {
            s.insert("old".to_string(), Value::String("3".to_string()));
        }

        let out = marshal_to_string(&mut format, &map);
        assert!(out.contains("old = 3"), "new active key should appear: {out}");
        assert!(out.contains("# old = 1"), "comment preserved: {out}");
    }

    #[test]
    fn from_scratch_emits_root_then_sections() {
        let mut format = IniFormat::new();

        let mut root = Map::new();
        root.insert("rootkey".to_string(), Value::String("rootvalue".to_string()));
        let mut section = Map::new();
        section.insert("key1".to_string(), Value::String("value1".to_string()));
        section.insert("gone".to_string(), Value::Deleted);

        let mut data = Map::new();
        data.insert(String::new(), Value::Map(root));
        data.insert("section1".to_string(), Value::Map(section));

        assert_eq!(
            marshal_to_string(&mut format, &data),
            "rootkey = rootvalue\n[section1]\nkey1 = value1\n"
        );
    }

    #[test]
    fn edit_then_reparse_yields_the_edited_map() {
        let input = "[db]\nhost = old\n";
        let mut format = IniFormat::new();
        let mut map = format.unmarshal(input.as_bytes()).unwrap();
        if let Value::Map(db) = map.get_mut("db").unwrap() {
            db.insert("host".to_string(), Value::String("new".to_string()));
        }
        let emitted = marshal_to_string(&mut format, &map);

        let mut second = IniFormat::new();
        let reparsed = second.unmarshal(emitted.as_bytes()).unwrap();
        assert_eq!(reparsed, map);
    }
}
