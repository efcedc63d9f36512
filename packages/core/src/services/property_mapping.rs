//! Custom Property Mapping
//!
//! On import, front matter keys that are not page properties can be routed
//! into typed remote properties. Each mapping names the front matter key,
//! the remote property and the kind of value it holds; values that cannot
//! be read as that kind are skipped with a warning.

use crate::models::{parse_page_date, PropertyValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value type of a remote property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    #[default]
    Text,
    Number,
    Select,
    MultiSelect,
    Date,
    Checkbox,
    Url,
}

/// Target of one front matter key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMapping {
    /// Remote property name
    pub name: String,

    #[serde(default)]
    pub kind: PropertyKind,
}

impl PropertyMapping {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Typed properties for every mapped key present in `extra`
///
/// `mapping` is keyed by front matter key. Missing, null and blank values
/// are not written.
pub fn map_custom_properties(
    extra: &BTreeMap<String, Value>,
    mapping: &BTreeMap<String, PropertyMapping>,
) -> BTreeMap<String, PropertyValue> {
    let mut properties = BTreeMap::new();

    for (key, target) in mapping {
        let name = target.name.trim();
        if name.is_empty() {
            tracing::warn!("Property mapping for '{}' has no target name, skipping", key);
            continue;
        }
        let Some(value) = extra.get(key).filter(|value| !is_blank(value)) else {
            continue;
        };

        match convert(value, target.kind) {
            Some(converted) => {
                properties.insert(name.to_string(), converted);
            }
            None => tracing::warn!(
                "Front matter field '{}' cannot be read as {:?}, skipping",
                key,
                target.kind
            ),
        }
    }

    properties
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn convert(value: &Value, kind: PropertyKind) -> Option<PropertyValue> {
    match kind {
        PropertyKind::Text => text(value).map(PropertyValue::Text),
        PropertyKind::Select => first_text(value).map(PropertyValue::Select),
        PropertyKind::Url => first_text(value).map(PropertyValue::Url),
        PropertyKind::MultiSelect => {
            let items = items(value);
            (!items.is_empty()).then_some(PropertyValue::MultiSelect(items))
        }
        PropertyKind::Number => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .map(PropertyValue::Number),
        PropertyKind::Date => first_text(value)
            .as_deref()
            .and_then(parse_page_date)
            .map(|date| PropertyValue::Date(date.format("%Y-%m-%d").to_string())),
        PropertyKind::Checkbox => match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0),
            _ => None,
        }
        .map(PropertyValue::Checkbox),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}

/// Scalars as-is; lists joined with commas
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Array(values) => {
            let joined = values
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(", ");
            Some(joined).filter(|text| !text.is_empty())
        }
        other => scalar_text(other),
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(values) => values.iter().find_map(scalar_text),
        other => scalar_text(other),
    }
}

fn items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extra(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    fn single(key: &str, name: &str, kind: PropertyKind) -> BTreeMap<String, PropertyMapping> {
        BTreeMap::from([(key.to_string(), PropertyMapping::new(name, kind))])
    }

    #[test]
    fn test_each_kind() {
        let fields = extra(json!({
            "author": "Ann",
            "rating": "4.5",
            "series": ["Intro", "Later"],
            "keywords": ["a", 2, true],
            "published": "2024/03/09",
            "featured": "true",
            "source": "https://example.com",
            "authors": ["Ann", "Bo"]
        }));
        let mapping = BTreeMap::from([
            ("author".to_string(), PropertyMapping::new("Author", PropertyKind::Text)),
            ("rating".to_string(), PropertyMapping::new("Rating", PropertyKind::Number)),
            ("series".to_string(), PropertyMapping::new("Series", PropertyKind::Select)),
            ("keywords".to_string(), PropertyMapping::new("Keywords", PropertyKind::MultiSelect)),
            ("published".to_string(), PropertyMapping::new("Published", PropertyKind::Date)),
            ("featured".to_string(), PropertyMapping::new("Featured", PropertyKind::Checkbox)),
            ("source".to_string(), PropertyMapping::new("Source", PropertyKind::Url)),
            ("authors".to_string(), PropertyMapping::new("Authors", PropertyKind::Text)),
        ]);

        let mapped = map_custom_properties(&fields, &mapping);

        assert_eq!(mapped["Author"], PropertyValue::Text("Ann".to_string()));
        assert_eq!(mapped["Rating"], PropertyValue::Number(4.5));
        assert_eq!(mapped["Series"], PropertyValue::Select("Intro".to_string()));
        assert_eq!(
            mapped["Keywords"],
            PropertyValue::MultiSelect(vec!["a".to_string(), "2".to_string(), "true".to_string()])
        );
        assert_eq!(mapped["Published"], PropertyValue::Date("2024-03-09".to_string()));
        assert_eq!(mapped["Featured"], PropertyValue::Checkbox(true));
        assert_eq!(mapped["Source"], PropertyValue::Url("https://example.com".to_string()));
        assert_eq!(mapped["Authors"], PropertyValue::Text("Ann, Bo".to_string()));
    }

    #[test]
    fn test_missing_blank_and_unreadable_values_are_skipped() {
        let fields = extra(json!({"empty": "  ", "nothing": null, "rating": "lots", "when": "soon"}));
        let mapping = BTreeMap::from([
            ("absent".to_string(), PropertyMapping::new("Absent", PropertyKind::Text)),
            ("empty".to_string(), PropertyMapping::new("Empty", PropertyKind::Text)),
            ("nothing".to_string(), PropertyMapping::new("Nothing", PropertyKind::Text)),
            ("rating".to_string(), PropertyMapping::new("Rating", PropertyKind::Number)),
            ("when".to_string(), PropertyMapping::new("When", PropertyKind::Date)),
        ]);

        assert!(map_custom_properties(&fields, &mapping).is_empty());
    }

    #[test]
    fn test_false_checkbox_is_written() {
        let fields = extra(json!({"draft": false}));
        let mapped =
            map_custom_properties(&fields, &single("draft", "Draft", PropertyKind::Checkbox));
        assert_eq!(mapped["Draft"], PropertyValue::Checkbox(false));
    }

    #[test]
    fn test_blank_target_name_is_skipped() {
        let fields = extra(json!({"author": "Ann"}));
        assert!(map_custom_properties(&fields, &single("author", " ", PropertyKind::Text)).is_empty());
    }

    #[test]
    fn test_mapping_deserializes_with_default_kind() {
        let mapping: PropertyMapping = serde_json::from_value(json!({"name": "Author"})).unwrap();
        assert_eq!(mapping, PropertyMapping::new("Author", PropertyKind::Text));

        let kind: PropertyKind = serde_json::from_value(json!("multiSelect")).unwrap();
        assert_eq!(kind, PropertyKind::MultiSelect);
    }
}
