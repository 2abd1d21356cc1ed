//! YAML frontmatter as an ordered list of fields
//!
//! Only the fields we change are re-rendered; every other field is written
//! back exactly as it was read. Field values are decoded with serde_yaml,
//! falling back to a permissive reading for the sloppy forms people type by
//! hand (`tags: #a #b`, unbalanced quotes).

use serde_yaml::Value;

use crate::constants as C;

/// Decoded value of a top-level field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    /// Nested mappings, block scalars and anything else we leave alone
    Opaque,
}

/// One top-level frontmatter entry
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// `None` for comments or blank lines ahead of the first key
    pub key: Option<String>,
    pub value: FieldValue,
    /// Source lines, each with its original line ending
    raw: String,
    dirty: bool,
}

impl Field {
    fn keyed(key: &str, value: FieldValue) -> Self {
        Self {
            key: Some(key.to_string()),
            value,
            raw: String::new(),
            dirty: true,
        }
    }

    fn render(&self, newline: &str) -> String {
        if !self.dirty {
            return self.raw.clone();
        }
        let key = self.key.as_deref().unwrap_or_default();
        match &self.value {
            FieldValue::List(items) => format!("{}: [{}]{}", key, quote_list(items), newline),
            FieldValue::Scalar(s) => format!("{}: {}{}", key, s, newline),
            FieldValue::Opaque => self.raw.clone(),
        }
    }

    /// Items of a list field, or a scalar split on commas and whitespace
    pub fn items(&self) -> Vec<String> {
        match &self.value {
            FieldValue::List(items) => items.clone(),
            FieldValue::Scalar(s) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(|item| item.trim_matches(|c: char| c == '"' || c == '\''))
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            FieldValue::Opaque => Vec::new(),
        }
    }

    fn is_tag_field(&self) -> bool {
        self.key
            .as_deref()
            .map(|k| C::TAG_FIELD_NAMES.iter().any(|name| k.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }
}

/// Parsed frontmatter block
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    fields: Vec<Field>,
    modified: bool,
    /// Line ending used for delimiters and re-rendered fields
    newline: &'static str,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            modified: false,
            newline: "\n",
        }
    }
}

impl Frontmatter {
    /// Parse the inside of a frontmatter block (without delimiters)
    pub fn parse(block: &str) -> Self {
        let newline = line_ending(block);
        let mut fields: Vec<Field> = Vec::new();

        for chunk in block.split_inclusive('\n') {
            let line = chunk.trim_end_matches(|c: char| c == '\r' || c == '\n');
            let mut raw = chunk.to_string();
            if !raw.ends_with('\n') {
                raw.push_str(newline);
            }

            if let Some((key, _)) = split_key_line(line) {
                fields.push(Field {
                    key: Some(key.to_string()),
                    value: FieldValue::Opaque,
                    raw,
                    dirty: false,
                });
            } else if let Some(last) = fields.last_mut() {
                last.raw.push_str(&raw);
            } else {
                fields.push(Field {
                    key: None,
                    value: FieldValue::Opaque,
                    raw,
                    dirty: false,
                });
            }
        }

        for field in fields.iter_mut().filter(|f| f.key.is_some()) {
            field.value = decode_value(&field.raw);
        }

        Self {
            fields,
            modified: false,
            newline,
        }
    }

    /// An empty block that will render with the line endings of `body`
    pub fn matching(body: &str) -> Self {
        Self {
            newline: line_ending(body),
            ..Self::default()
        }
    }

    /// All keyed fields, in source order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.key.is_some())
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields().find(|f| f.key.as_deref() == Some(key))
    }

    /// Raw (un-normalized) tag values from every tag field
    pub fn tag_values(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.is_tag_field())
            .flat_map(|f| f.items())
            .collect()
    }

    /// Key of the first tag field, if any
    pub fn tag_field_key(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_tag_field())
            .and_then(|f| f.key.as_deref())
    }

    /// Replace the value of `key` with a list, appending the field if absent
    pub fn set_list(&mut self, key: &str, items: Vec<String>) {
        self.modified = true;
        match self.fields.iter_mut().find(|f| f.key.as_deref() == Some(key)) {
            Some(field) => {
                field.value = FieldValue::List(items);
                field.dirty = true;
            }
            None => self.fields.push(Field::keyed(key, FieldValue::List(items))),
        }
    }

    /// Remove a field; returns whether it existed
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.key.as_deref() != Some(key));
        let removed = self.fields.len() != before;
        self.modified |= removed;
        removed
    }

    /// Rewrite every tag field through `f`, which returns the new items
    pub fn map_tag_fields(&mut self, mut f: impl FnMut(Vec<String>) -> Vec<String>) {
        let keys: Vec<String> = self
            .fields
            .iter()
            .filter(|field| field.is_tag_field())
            .filter_map(|field| field.key.clone())
            .collect();

        for key in keys {
            let items = self.get(&key).map(Field::items).unwrap_or_default();
            let updated = f(items.clone());
            if updated == items {
                continue;
            }
            if updated.is_empty() {
                self.remove(&key);
            } else {
                self.set_list(&key, updated);
            }
        }
    }

    /// True when no keyed field remains
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Render the block including delimiters
    pub fn render(&self) -> String {
        let mut out = format!("{}{}", C::FRONTMATTER_DELIMITER, self.newline);
        for field in &self.fields {
            out.push_str(&field.render(self.newline));
        }
        out.push_str(C::FRONTMATTER_DELIMITER);
        out.push_str(self.newline);
        out
    }
}

/// Split note content into its frontmatter (if any) and body
pub fn split(content: &str) -> (Option<Frontmatter>, &str) {
    match locate_block(content) {
        Some((block, body_start)) => {
            let mut fm = Frontmatter::parse(block);
            // The opening delimiter decides for blocks with fewer than two lines
            fm.newline = line_ending(&content[..body_start]);
            (Some(fm), &content[body_start..])
        }
        None => (None, content),
    }
}

fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Reassemble a note from frontmatter and body.
///
/// A block that lost its last field through an edit is dropped entirely.
pub fn assemble(frontmatter: Option<&Frontmatter>, body: &str) -> String {
    match frontmatter {
        Some(fm) if fm.is_empty() && fm.modified => body.to_string(),
        Some(fm) => format!("{}{}", fm.render(), body),
        None => body.to_string(),
    }
}

/// Find the frontmatter block: returns its inner text and the byte offset
/// where the body starts
fn locate_block(content: &str) -> Option<(&str, usize)> {
    let first_end = content.find('\n')?;
    if content[..first_end].trim_end() != C::FRONTMATTER_DELIMITER {
        return None;
    }

    let block_start = first_end + 1;
    let mut pos = block_start;
    while pos <= content.len() {
        let line_end = content[pos..].find('\n').map(|i| pos + i);
        let line = &content[pos..line_end.unwrap_or(content.len())];

        if line.trim_end() == C::FRONTMATTER_DELIMITER {
            // Inner text excludes the newline before the closing delimiter
            let block = content[block_start..pos].strip_suffix('\n').unwrap_or("");
            let block = block.strip_suffix('\r').unwrap_or(block);
            if block.len() > C::MAX_FRONTMATTER_SIZE {
                return None;
            }
            let body_start = line_end.map(|e| e + 1).unwrap_or(content.len());
            return Some((block, body_start));
        }

        match line_end {
            Some(e) => pos = e + 1,
            None => break,
        }
    }
    None
}

/// Split `key: rest` for a top-level key line
fn split_key_line(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    if first.is_whitespace() || first == '-' || first == '#' {
        return None;
    }
    for (idx, _) in line.match_indices(':') {
        let rest = &line[idx + 1..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            let key = line[..idx].trim();
            if key.is_empty() {
                return None;
            }
            return Some((key, rest.trim()));
        }
    }
    None
}

fn decode_value(raw: &str) -> FieldValue {
    let inline = raw
        .lines()
        .next()
        .and_then(split_key_line)
        .map(|(_, rest)| rest)
        .unwrap_or_default();

    let parsed = serde_yaml::from_str::<serde_yaml::Mapping>(raw)
        .ok()
        .and_then(|map| map.into_iter().next().map(|(_, v)| v));

    match parsed {
        // `tags: #a #b` reads as a comment in YAML
        Some(Value::Null) if inline.starts_with('#') => decode_loosely(raw, inline),
        Some(Value::Null) => {
            let loose = decode_loosely(raw, inline);
            match loose {
                FieldValue::List(_) => loose,
                _ => FieldValue::Scalar(String::new()),
            }
        }
        Some(Value::Sequence(items)) => {
            let scalars: Option<Vec<String>> = items.iter().map(scalar_string).collect();
            scalars.map(FieldValue::List).unwrap_or(FieldValue::Opaque)
        }
        Some(value) => scalar_string(&value)
            .map(FieldValue::Scalar)
            .unwrap_or(FieldValue::Opaque),
        None => decode_loosely(raw, inline),
    }
}

/// Best-effort reading of a field serde_yaml rejected or read as null
fn decode_loosely(raw: &str, inline: &str) -> FieldValue {
    if let Some(inner) = inline.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return FieldValue::List(
            inner
                .split(',')
                .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        );
    }

    if inline.is_empty() {
        let items: Vec<String> = raw
            .lines()
            .skip(1)
            .filter_map(|line| line.trim().strip_prefix('-'))
            .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if !items.is_empty() {
            return FieldValue::List(items);
        }
    }

    FieldValue::Scalar(inline.to_string())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ")
}
