//! Page Metadata and Documents
//!
//! [`PageProperties`] is the metadata record of one page as the remote
//! service reports it. [`FrontMatterFields`] is the same information as read
//! back from a Markdown header, where every field (title included) may be
//! missing. A [`Document`] pairs properties with the page's block tree.

use crate::models::BlockTree;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata record for one page
///
/// Only `id` and `title` are required. Absent is not the same as empty:
/// an absent field is `None` (or an empty `tags` list) and never shows up in
/// generated front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProperties {
    pub id: String,
    pub title: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// ISO date as reported; may be unparsable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Additional typed properties keyed by remote property name, filled
    /// from mapped front matter keys on import
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, PropertyValue>,
}

/// Value of a custom page property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Select(String),
    MultiSelect(Vec<String>),
    /// `YYYY-MM-DD`
    Date(String),
    Checkbox(bool),
    Url(String),
}

impl PageProperties {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Parsed `date`, if present and well-formed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_page_date)
    }

    /// Slug if set and non-blank, otherwise the page id
    pub fn slug_or_id(&self) -> &str {
        self.slug
            .as_deref()
            .filter(|slug| !slug.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// Page fields read from a front matter header
///
/// Mirrors [`PageProperties`] minus the id, with every field optional so a
/// missing key stays distinguishable from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatterFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl FrontMatterFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build page properties, taking the title from `fallback_title` when
    /// the header has none
    pub fn into_properties(self, id: impl Into<String>, fallback_title: &str) -> PageProperties {
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| fallback_title.to_string());

        PageProperties {
            id: id.into(),
            title,
            page_type: self.page_type,
            status: self.status,
            category: self.category,
            tags: self.tags.unwrap_or_default(),
            date: self.date,
            updated_date: self.updated_date,
            slug: self.slug,
            summary: self.summary,
            custom_properties: BTreeMap::new(),
        }
    }
}

/// A page's properties paired with its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub properties: PageProperties,
    pub blocks: BlockTree,
}

impl Document {
    /// Empty document whose block root id matches the page id
    pub fn new(properties: PageProperties) -> Self {
        let blocks = BlockTree::new(properties.id.clone());
        Self { properties, blocks }
    }
}

/// Parse a page date leniently
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339 timestamps and
/// `YYYY-MM-DD HH:MM[:SS]`; anything else is `None`.
pub fn parse_page_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp.date());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_page_date("2024-03-09"), Some(expected));
        assert_eq!(parse_page_date("2024/03/09"), Some(expected));
        assert_eq!(parse_page_date("2024-03-09T10:15:00Z"), Some(expected));
        assert_eq!(parse_page_date("2024-03-09T10:15:00+08:00"), Some(expected));
        assert_eq!(parse_page_date("2024-03-09 10:15"), Some(expected));
        assert_eq!(parse_page_date(" 2024-03-09 "), Some(expected));
    }

    #[test]
    fn test_parse_page_date_rejects_garbage() {
        assert_eq!(parse_page_date(""), None);
        assert_eq!(parse_page_date("yesterday"), None);
        assert_eq!(parse_page_date("2024-13-40"), None);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let props = PageProperties::new("p1", "Hello");
        let value = serde_json::to_value(&props).unwrap();

        assert_eq!(value, json!({"id": "p1", "title": "Hello"}));
    }

    #[test]
    fn test_custom_properties_serialize_tagged() {
        let mut props = PageProperties::new("p1", "Hello");
        props
            .custom_properties
            .insert("Rating".to_string(), PropertyValue::Number(4.5));
        props.custom_properties.insert(
            "Keywords".to_string(),
            PropertyValue::MultiSelect(vec!["a".to_string()]),
        );

        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(
            value["customProperties"],
            json!({
                "Keywords": {"type": "multiSelect", "value": ["a"]},
                "Rating": {"type": "number", "value": 4.5}
            })
        );

        let back: PageProperties = serde_json::from_value(value).unwrap();
        assert_eq!(back, props);
    }

    #[test]
    fn test_slug_falls_back_to_id() {
        let mut props = PageProperties::new("p1", "Hello");
        assert_eq!(props.slug_or_id(), "p1");

        props.slug = Some("  ".to_string());
        assert_eq!(props.slug_or_id(), "p1");

        props.slug = Some("hello-world".to_string());
        assert_eq!(props.slug_or_id(), "hello-world");
    }

    #[test]
    fn test_front_matter_fields_fallback_title() {
        let fields = FrontMatterFields {
            tags: Some(vec!["a".to_string()]),
            ..Default::default()
        };
        let props = fields.into_properties("p1", "notes");

        assert_eq!(props.title, "notes");
        assert_eq!(props.tags, vec!["a".to_string()]);
    }
}
