//! # Property Discovery
//!
//! A rule editor needs to know which fields exist and what operators make
//! sense for each. [`scan_properties`] answers that from a set of documents:
//! the fixed builtins first, then every frontmatter key in sorted order.
//!
//! The result is advisory. Matching never consults it; it re-derives the type
//! of the value it actually resolves (see [`FilterValue::property_type`]).

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::document::DocumentContext;
use crate::rules::{operators_for, Operator};
use crate::value::{FilterValue, PropertyType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDef {
    pub key: String,
    #[serde(rename = "type")]
    pub ty: PropertyType,
}

impl PropertyDef {
    pub fn new(key: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            key: key.into(),
            ty,
        }
    }

    pub fn operators(&self) -> &'static [Operator] {
        operators_for(self.ty)
    }
}

/// Fields every document has, in editor order.
pub const BUILTIN_PROPERTIES: &[(&str, PropertyType)] = &[
    ("file", PropertyType::File),
    ("file.name", PropertyType::Text),
    ("file.path", PropertyType::Text),
    ("file.folder", PropertyType::Text),
    ("file.extension", PropertyType::Text),
    ("file.size", PropertyType::Number),
    ("file.ctime", PropertyType::Datetime),
    ("file.mtime", PropertyType::Datetime),
    ("file tags", PropertyType::List),
    ("aliases", PropertyType::List),
];

/// Editor-time type of a raw frontmatter value.
pub fn infer_type(value: &Value) -> PropertyType {
    match value {
        Value::Null => PropertyType::Unknown,
        Value::Object(_) => PropertyType::Text,
        other => FilterValue::from_json(other).property_type(),
    }
}

pub fn scan_properties<'a>(docs: impl IntoIterator<Item = &'a DocumentContext>) -> Vec<PropertyDef> {
    let mut found: BTreeMap<String, PropertyType> = BTreeMap::new();
    for doc in docs {
        for (key, value) in &doc.frontmatter {
            if BUILTIN_PROPERTIES.iter().any(|(name, _)| name == key) {
                continue;
            }
            let ty = infer_type(value);
            let slot = found.entry(key.clone()).or_insert(PropertyType::Unknown);
            if *slot == PropertyType::Unknown {
                *slot = ty;
            }
        }
    }

    BUILTIN_PROPERTIES
        .iter()
        .map(|(key, ty)| PropertyDef::new(*key, *ty))
        .chain(found.into_iter().map(|(key, ty)| PropertyDef::new(key, ty)))
        .collect()
}
