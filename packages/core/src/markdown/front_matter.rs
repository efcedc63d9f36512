//! Front Matter Codec
//!
//! Reads and writes the `---`-delimited metadata header of a Markdown
//! document. Headers are read as YAML with `serde_yaml`; known keys map onto
//! [`FrontMatterFields`] and everything else is kept as JSON in
//! [`ParsedFrontMatter::extra`]. Malformed YAML becomes an issue, never an
//! error.
//!
//! Headers are written by hand so the layout is exact. Output key order is
//! fixed: `title`, `date`, `updated`, `tags`,
//! `categories`, `slug`, `status`, `type`, `summary`, then any custom fields.
//! Absent or empty values are omitted.

use crate::models::{parse_page_date, FrontMatterFields, PageProperties};
use crate::services::error::SyncError;
use serde_json::Value;
use serde_yaml::{Mapping, Value as Yaml};
use std::collections::BTreeMap;

/// Largest document accepted for decoding (1MB)
pub const MAX_DOCUMENT_SIZE: usize = 1_000_000;

const DELIMITER: &str = "---";

/// Keys owned by page properties; custom fields may not reuse them
const RESERVED_KEYS: &[&str] = &[
    "title",
    "date",
    "updated",
    "tags",
    "categories",
    "category",
    "slug",
    "status",
    "type",
    "summary",
];

/// Result of reading a header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFrontMatter {
    pub fields: FrontMatterFields,

    /// Keys with no page-property mapping, kept verbatim
    pub extra: BTreeMap<String, Value>,

    /// Everything after the closing delimiter (the whole input when there is
    /// no header)
    pub body: String,

    /// Non-fatal problems, e.g. an unparsable date
    pub issues: Vec<String>,
}

/// Header for `properties` with no custom fields
pub fn encode(properties: &PageProperties) -> String {
    encode_with(properties, &BTreeMap::new())
}

/// Header for `properties` followed by `custom_fields`
///
/// Custom fields whose key collides with a page property, or whose value is
/// null or an object, are skipped.
pub fn encode_with(properties: &PageProperties, custom_fields: &BTreeMap<String, Value>) -> String {
    let mut lines = Vec::new();

    push_scalar(&mut lines, "title", Some(&properties.title));
    push_scalar(&mut lines, "date", properties.date.as_deref());
    push_scalar(&mut lines, "updated", properties.updated_date.as_deref());
    push_list(&mut lines, "tags", &properties.tags);
    push_list(&mut lines, "categories", properties.category.as_slice());
    push_scalar(&mut lines, "slug", properties.slug.as_deref());
    push_scalar(&mut lines, "status", properties.status.as_deref());
    push_scalar(&mut lines, "type", properties.page_type.as_deref());
    push_scalar(&mut lines, "summary", properties.summary.as_deref());

    for (key, value) in custom_fields {
        let key = key.trim();
        if key.is_empty() || key.contains(':') {
            tracing::warn!("Skipping custom front matter field with invalid key {:?}", key);
            continue;
        }
        if RESERVED_KEYS.contains(&key) {
            tracing::warn!(
                "Custom front matter field '{}' collides with a page property, skipping",
                key
            );
            continue;
        }
        push_custom(&mut lines, key, value);
    }

    if lines.is_empty() {
        return format!("{}\n{}", DELIMITER, DELIMITER);
    }
    format!("{}\n{}\n{}", DELIMITER, lines.join("\n"), DELIMITER)
}

fn push_scalar(lines: &mut Vec<String>, key: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("{}: {}", key, quote(value)));
    }
}

fn push_list<S: AsRef<str>>(lines: &mut Vec<String>, key: &str, items: &[S]) {
    let items: Vec<&str> = items
        .iter()
        .map(|item| item.as_ref().trim())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }

    lines.push(format!("{}:", key));
    for item in items {
        lines.push(format!("  - {}", list_item(item)));
    }
}

fn push_custom(lines: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::String(s) => push_scalar(lines, key, Some(s)),
        Value::Number(n) => lines.push(format!("{}: {}", key, n)),
        Value::Bool(b) => lines.push(format!("{}: {}", key, b)),
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
                    _ => None,
                })
                .collect();
            push_list(lines, key, &items);
        }
        Value::Null | Value::Object(_) => {
            tracing::debug!("Skipping custom front matter field '{}' with no scalar value", key);
        }
    }
}

/// Double-quoted YAML scalar
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => {}
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// List items stay bare when YAML reads them back as the same string
fn list_item(item: &str) -> String {
    match serde_yaml::from_str::<Yaml>(item) {
        Ok(Yaml::String(read)) if read == item => item.to_string(),
        _ => quote(item),
    }
}

/// First non-blank scalar, stringified; a list yields its first item
fn scalar(value: &Yaml) -> Option<String> {
    let text = match value {
        Yaml::String(s) => s.trim().to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Sequence(items) => return items.iter().find_map(scalar),
        Yaml::Tagged(tagged) => return scalar(&tagged.value),
        Yaml::Null | Yaml::Mapping(_) => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}

fn list(value: &Yaml) -> Vec<String> {
    match value {
        Yaml::Sequence(items) => items.iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    }
}

/// A bare `tags:` is absent; `tags: []` is present and empty
fn tags(value: &Yaml) -> Option<Vec<String>> {
    match value {
        Yaml::Null => None,
        Yaml::String(s) if s.trim().is_empty() => None,
        other => Some(list(other)),
    }
}

fn key_name(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.trim().to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read the header at the start of `raw`
///
/// Never fails: a missing or unterminated header yields empty fields and the
/// whole input as body, and malformed YAML is reported in `issues`.
pub fn decode(raw: &str) -> ParsedFrontMatter {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((header, body)) = split_header(raw) else {
        return ParsedFrontMatter {
            body: raw.to_string(),
            ..Default::default()
        };
    };

    let mut issues = Vec::new();
    let mapping = parse_mapping(header, &mut issues);

    let mut fields = FrontMatterFields::default();
    let mut extra = BTreeMap::new();
    let mut categories = None;

    for (key, value) in mapping {
        let Some(key) = key_name(&key) else {
            issues.push(format!("Unsupported front matter key: {:?}", key));
            continue;
        };
        match key.as_str() {
            "title" => fields.title = scalar(&value),
            "date" => fields.date = scalar(&value),
            "updated" | "updatedDate" => fields.updated_date = scalar(&value),
            "tags" => fields.tags = tags(&value),
            "category" => fields.category = scalar(&value),
            "categories" => categories = list(&value).into_iter().next(),
            "slug" => fields.slug = scalar(&value),
            "status" => fields.status = scalar(&value),
            "type" => fields.page_type = scalar(&value),
            "summary" => fields.summary = scalar(&value),
            _ => match serde_json::to_value(&value) {
                Ok(json) => {
                    extra.insert(key, json);
                }
                Err(error) => {
                    tracing::debug!("Dropping front matter field '{}': {}", key, error);
                }
            },
        }
    }

    // An explicit `category` wins over the first of `categories`
    if fields.category.is_none() {
        fields.category = categories;
    }

    // `description` stands in for a missing summary
    if fields.summary.is_none() {
        if let Some(Value::String(description)) = extra.get("description") {
            fields.summary = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        }
    }

    for (key, value) in [("date", &fields.date), ("updated", &fields.updated_date)] {
        if let Some(value) = value {
            if parse_page_date(value).is_none() {
                issues.push(format!("Invalid date format for '{}': {}", key, value));
            }
        }
    }

    ParsedFrontMatter {
        fields,
        extra,
        body: body.to_string(),
        issues,
    }
}

/// [`decode`] with a size guard
pub fn decode_checked(raw: &str) -> Result<ParsedFrontMatter, SyncError> {
    if raw.len() > MAX_DOCUMENT_SIZE {
        return Err(SyncError::conversion_failure(format!(
            "Document too large: {} bytes (max {} bytes)",
            raw.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    Ok(decode(raw))
}

/// Split `raw` into header text and body at the delimiter lines
fn split_header(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&raw[header_start..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Header text as a YAML mapping; anything else is reported and read as empty
fn parse_mapping(header: &str, issues: &mut Vec<String>) -> Mapping {
    let has_content = header.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_content {
        return Mapping::new();
    }

    match serde_yaml::from_str::<Yaml>(header) {
        Ok(Yaml::Mapping(mapping)) => mapping,
        Ok(Yaml::Null) => Mapping::new(),
        Ok(_) => {
            issues.push("Front matter is not a key/value mapping".to_string());
            Mapping::new()
        }
        Err(error) => {
            issues.push(format!("Invalid front matter: {}", error));
            Mapping::new()
        }
    }
}

#[cfg(test)]
#[path = "front_matter_test.rs"]
mod front_matter_test;
