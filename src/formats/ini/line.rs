//! Structure-preserving INI line model.
//!
//! An INI file is parsed into an ordered vector of [`Line`] records rather
//! than a map. Every byte of the source lands in some field — indent,
//! comment prefix, key, delimiter segment (the delimiter plus its exact
//! surrounding whitespace), value, suffix — so serializing an unmodified
//! line vector reproduces the input. Comment lines are deliberately *not*
//! parsed into key/value structure: real files contain things like
//! `# host = 10.0.0.1 (old)` that are prose, not suppressed keys.

use crate::config::{Map, Value};

/// Parser options for the INI line model.
#[derive(Debug, Clone)]
pub struct IniOptions {
    /// Emit ` = ` around the delimiter for newly constructed lines.
    /// Existing lines always keep their original delimiter segment.
    pub use_spacing: bool,
    /// Bytes that begin a comment line.
    pub comment_chars: Vec<u8>,
    /// The key-value delimiter byte.
    pub delimiter: u8,
}

impl Default for IniOptions {
    fn default() -> Self {
        Self {
            use_spacing: true,
            comment_chars: vec![b'#', b';'],
            delimiter: b'=',
        }
    }
}

impl IniOptions {
    /// Apply an options mapping from a file target's `options` table.
    ///
    /// Tolerant by contract: unknown keys, wrong-typed values, and an empty
    /// `comment_chars` string are ignored and the defaults retained.
    pub fn apply(&mut self, options: &Map) {
        if let Some(Value::Bool(use_spacing)) = options.get("use_spacing") {
            self.use_spacing = *use_spacing;
        }
        if let Some(Value::String(chars)) = options.get("comment_chars")
            && !chars.is_empty()
        {
            self.comment_chars = chars.bytes().collect();
        }
        if let Some(Value::String(delimiter)) = options.get("delimiter")
            && let Some(first) = delimiter.bytes().next()
        {
            self.delimiter = first;
        }
    }
}

/// A single line of an INI file with all of its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    /// The section this line belongs to (`""` before any section header),
    /// or the header name itself when `is_section` is set.
    pub section: String,
    /// Key text. For comment lines this holds the full text after the
    /// comment prefix, unparsed.
    pub key: String,
    /// Value text, trailing whitespace preserved (inline comments such as
    /// `  # foo` are part of the value and round-trip untouched).
    pub value: String,
    /// Leading whitespace run.
    pub indent: String,
    /// The delimiter byte plus its surrounding whitespace, exactly as
    /// written. Empty for bare keys and newly constructed lines.
    pub delimiter: String,
    /// Text after a section header's `]`, including inline comments.
    pub suffix: String,
    /// The comment character plus any following spaces, when this is a
    /// comment line.
    pub comment_prefix: String,
    /// The source line, verbatim. Re-emitted for untouched empty and pure
    /// comment lines.
    pub original: String,
    /// Whitespace-only line.
    pub is_empty: bool,
    /// Section header line.
    pub is_section: bool,
}

impl Line {
    /// Whether this line is an active (uncommented) key line.
    #[must_use]
    pub fn is_active_key(&self) -> bool {
        !self.key.is_empty() && self.comment_prefix.is_empty() && !self.is_section
    }
}

/// Tokenizer and serializer for the line model.
#[derive(Debug, Clone, Default)]
pub struct IniParser {
    pub options: IniOptions,
}

impl IniParser {
    #[must_use]
    pub fn new(options: IniOptions) -> Self {
        Self { options }
    }

    /// Tokenize source text into a line vector.
    ///
    /// The parser is total: malformed input (missing `]`, duplicate keys,
    /// bare keys) is captured, never rejected.
    #[must_use]
    pub fn parse(&self, data: &str) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current_section = String::new();
        for raw in data.lines() {
            let line = self.parse_line(raw, &current_section);
            if line.is_section {
                current_section = line.section.clone();
            }
            lines.push(line);
        }
        lines
    }

    /// Parse a single line, tagging it with the section it appears in.
    #[must_use]
    pub fn parse_line(&self, raw: &str, section: &str) -> Line {
        let mut line = Line {
            original: raw.to_string(),
            section: section.to_string(),
            ..Line::default()
        };

        let bytes = raw.as_bytes();
        let n = bytes.len();
        if n == 0 {
            line.is_empty = true;
            return line;
        }

        // Leading whitespace run.
        let mut i = 0;
        while i < n && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i > 0 {
            line.indent = raw[..i].to_string();
        }
        if i >= n {
            line.is_empty = true;
            return line;
        }

        // Comment line: the comment char and any following spaces form the
        // prefix, the rest is opaque text stored in `key`.
        if self.options.comment_chars.contains(&bytes[i]) {
            let comment_start = i;
            i += 1;
            while i < n && (bytes[i] == b' ' || bytes[i] == b'\t') {
                i += 1;
            }
            line.comment_prefix = raw[comment_start..i].to_string();
            if i < n {
                line.key = raw[i..].to_string();
            }
            return line;
        }

        // Section header.
        if bytes[i] == b'[' {
            line.is_section = true;
            let section_start = i + 1;
            i += 1;
            while i < n && bytes[i] != b']' {
                i += 1;
            }
            if i < n {
                line.section = raw[section_start..i].to_string();
                i += 1;
                if i < n {
                    line.suffix = raw[i..].to_string();
                }
            } else {
                // No closing bracket: malformed, but preserved.
                line.section = raw[section_start..].to_string();
            }
            return line;
        }

        // Key line: scan for the delimiter.
        let key_start = i;
        while i < n && bytes[i] != self.options.delimiter {
            i += 1;
        }

        if i < n {
            // Trim inner whitespace off the key; the trimmed run belongs to
            // the delimiter segment.
            let mut key_end = i;
            while key_end > key_start
                && (bytes[key_end - 1] == b' ' || bytes[key_end - 1] == b'\t')
            {
                key_end -= 1;
            }
            line.key = raw[key_start..key_end].to_string();

            let delim_start = key_end;
            i += 1;
            while i < n && (bytes[i] == b' ' || bytes[i] == b'\t') {
                i += 1;
            }
            line.delimiter = raw[delim_start..i].to_string();
            if i < n {
                line.value = raw[i..].to_string();
            }
        } else {
            // No delimiter: bare key.
            line.key = raw[key_start..].to_string();
        }

        line
    }

    /// Serialize a line vector back to text, one trailing newline per line.
    #[must_use]
    pub fn serialize(&self, lines: &[Line]) -> String {
        let mut out = String::new();
        for line in lines {
            self.write_line(&mut out, line);
        }
        out
    }

    fn write_line(&self, out: &mut String, line: &Line) {
        // Untouched empty lines and pure comments re-emit their source
        // bytes verbatim.
        if line.is_empty || (!line.comment_prefix.is_empty() && line.key.is_empty()) {
            out.push_str(&line.original);
            out.push('\n');
            return;
        }

        out.push_str(&line.indent);
        out.push_str(&line.comment_prefix);

        if line.is_section {
            out.push('[');
            out.push_str(&line.section);
            out.push(']');
            out.push_str(&line.suffix);
            out.push('\n');
            return;
        }

        if !line.key.is_empty() {
            out.push_str(&line.key);
            if !line.delimiter.is_empty() {
                out.push_str(&line.delimiter);
                out.push_str(&line.value);
            } else if !line.value.is_empty() {
                if self.options.use_spacing {
                    out.push(' ');
                    out.push(self.options.delimiter as char);
                    out.push(' ');
                } else {
                    out.push(self.options.delimiter as char);
                }
                out.push_str(&line.value);
            }
        }

        out.push_str(&line.suffix);
        out.push('\n');
    }
}

/// Set the value of the first matching active key in `section`.
pub fn update_value(lines: &mut [Line], section: &str, key: &str, new_value: &str) {
    let mut current_section = String::new();
    for line in lines.iter_mut() {
        if line.is_section {
            current_section = line.section.clone();
        } else if current_section == section && line.key == key {
            line.value = new_value.to_string();
            break;
        }
    }
}

/// Insert a new key line into `section`.
///
/// Root keys go before the first empty line, section header, or commented
/// key — whichever comes first — so they stay in the file's preamble.
/// Section keys go immediately after the section's last active key.
pub fn add_key(lines: &mut Vec<Line>, section: &str, key: &str, value: &str) {
    let mut insert_index = lines.len();

    if section.is_empty() {
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty
                || line.is_section
                || (!line.comment_prefix.is_empty() && !line.key.is_empty())
            {
                insert_index = i;
                break;
            }
        }
    } else {
        let mut in_section = false;
        let mut last_key_index = None;
        for (i, line) in lines.iter().enumerate() {
            if line.is_section {
                if line.section == section {
                    in_section = true;
                } else if in_section {
                    break;
                }
            } else if in_section && line.is_active_key() {
                last_key_index = Some(i);
            }
        }
        if let Some(index) = last_key_index {
            insert_index = index + 1;
        }
    }

    lines.insert(
        insert_index,
        Line {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            ..Line::default()
        },
    );
}

/// Look up the value of the first matching active key in `section`.
#[must_use]
pub fn get_value<'a>(lines: &'a [Line], section: &str, key: &str) -> Option<&'a str> {
    let mut current_section = "";
    for line in lines {
        if line.is_section {
            current_section = &line.section;
        } else if current_section == section && line.key == key {
            return Some(&line.value);
        }
    }
    None
}

/// Whether a key exists (commented or not) in `section`.
#[must_use]
pub fn key_exists(lines: &[Line], section: &str, key: &str) -> bool {
    get_value(lines, section, key).is_some()
}
