//! Structured-document parsing and serialization.
//!
//! Extension assets are markdown documents with a structured preamble: a
//! `---`-fenced block of flat key/value pairs followed by free-form body
//! text. List-valued fields use the fixed comma separator and are decoded on
//! read by [`parse_comma_separated`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Delimiter line opening and closing the preamble block.
pub const PREAMBLE_DELIMITER: &str = "---";

/// Canonical separator for list-valued preamble fields.
const LIST_SEPARATOR: &str = ", ";

/// Flat key/value preamble of a structured document.
///
/// Values are stored as scalar strings; list-valued fields hold the canonical
/// comma-joined form and are decoded on read with [`Preamble::list`]. Keys are
/// kept in stable (sorted) order so serialization is byte-deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preamble {
    entries: BTreeMap<String, String>,
}

impl Preamble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set a field only when a value is present. `None` is a no-op: unset
    /// fields are never emitted as empty keys.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Set a list-valued field in the canonical comma-joined form.
    /// An empty list is a no-op, like [`Preamble::insert_opt`] with `None`.
    pub fn insert_list<S: AsRef<str>>(&mut self, key: impl Into<String>, items: &[S]) {
        if items.is_empty() {
            return;
        }
        let joined = items
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        self.insert(key, joined);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Decode a list-valued field. Absent keys yield an empty vec.
    pub fn list(&self, key: &str) -> Vec<String> {
        parse_comma_separated(self.get(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed structured document: preamble plus free-form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredDocument {
    pub preamble: Preamble,
    pub body: String,
}

impl StructuredDocument {
    fn body_only(text: &str) -> Self {
        Self {
            preamble: Preamble::default(),
            body: text.to_string(),
        }
    }
}

/// Parse a document into preamble and body. Never fails: text without a
/// leading delimiter, an unterminated fence, or a malformed block all yield
/// an empty preamble with the entire input as body.
pub fn parse(text: &str) -> StructuredDocument {
    let Some((block, rest)) = split_fenced(text) else {
        return StructuredDocument::body_only(text);
    };

    match decode_preamble(block) {
        Some(preamble) => StructuredDocument {
            preamble,
            body: strip_one_blank_line(rest).to_string(),
        },
        None => StructuredDocument::body_only(text),
    }
}

/// Serialize a preamble and body back into document text.
///
/// Keys are emitted in stable order; the closing delimiter is followed by one
/// blank separator line, which [`parse`] strips again, so round-tripping a
/// document reproduces the body byte-for-byte.
pub fn serialize(preamble: &Preamble, body: &str) -> String {
    let mut out = String::new();
    out.push_str(PREAMBLE_DELIMITER);
    out.push('\n');
    for (key, value) in preamble.iter() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(PREAMBLE_DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Decode a comma-separated list value: elements are trimmed, empty segments
/// dropped. `None` decodes to an empty vec.
pub fn parse_comma_separated(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split `text` at the preamble fences. Returns `(block, remainder)` only
/// when the text starts with the delimiter and a closing delimiter line
/// exists; otherwise `None` (treated as no preamble by the caller).
fn split_fenced(text: &str) -> Option<(&str, &str)> {
    let after_open = text.strip_prefix(PREAMBLE_DELIMITER)?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))?;

    let mut offset = 0usize;
    loop {
        let line_end = after_open[offset..].find('\n').map(|i| offset + i);
        let line = match line_end {
            Some(end) => &after_open[offset..end],
            None => &after_open[offset..],
        };
        if line.strip_suffix('\r').unwrap_or(line) == PREAMBLE_DELIMITER {
            let block = &after_open[..offset];
            let body_start = line_end.map(|end| end + 1).unwrap_or(after_open.len());
            return Some((block, &after_open[body_start..]));
        }
        match line_end {
            Some(end) => offset = end + 1,
            None => return None,
        }
    }
}

/// Raw preamble value as decoded from the fenced block. Kept untagged so the
/// block stays a flat scalar mapping regardless of how authors spell values.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
    Number(f64),
    Other(serde_json::Value),
}

/// Decode the fenced block into a flat preamble. Returns `None` when the
/// block is not a mapping of scalars; the caller falls back to body-only.
fn decode_preamble(block: &str) -> Option<Preamble> {
    if block.trim().is_empty() {
        return Some(Preamble::default());
    }

    let raw: BTreeMap<String, RawValue> = serde_yaml_bw::from_str(block).ok()?;

    let mut preamble = Preamble::default();
    for (key, value) in raw {
        match value {
            RawValue::Text(s) => preamble.insert(key, s),
            RawValue::List(items) => preamble.insert_list(key, &items),
            RawValue::Flag(b) => preamble.insert(key, b.to_string()),
            RawValue::Number(n) => preamble.insert(key, n.to_string()),
            // Nulls are dropped; nested structures are not part of the flat
            // preamble contract.
            RawValue::Other(serde_json::Value::Null) => {}
            RawValue::Other(_) => {
                tracing::debug!(key = %key, "skipping non-scalar preamble value");
            }
        }
    }
    Some(preamble)
}

/// Strip at most one leading blank line from the body remainder.
fn strip_one_blank_line(rest: &str) -> &str {
    rest.strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest)
}

// ── Name helpers ─────────────────────────────────────────────────────────────

/// Convert `kebab-case` to `camelCase`. Single-word input is returned as-is.
pub fn kebab_to_camel(name: &str) -> String {
    let mut parts = name.split('-').filter(|p| !p.is_empty());
    let Some(first) = parts.next() else {
        return String::new();
    };
    let mut out = first.to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Convert `camelCase` to `kebab-case`. Single-word input is returned as-is.
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert `kebab-case` to `snake_case` (used for tool naming).
pub fn kebab_to_snake(name: &str) -> String {
    name.replace('-', "_")
}

/// Extract the base name from a path: directory components and the file
/// extension are stripped.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
