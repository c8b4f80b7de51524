//! # Field Values
//!
//! Frontmatter is only typed at the moment it is used, so every value that flows
//! through rule matching and filter chains is normalized into [`FilterValue`], an
//! explicit tagged union. Matching and filter functions pattern-match on the tag
//! instead of guessing at runtime.
//!
//! | Variant | Produced from |
//! |---------|---------------|
//! | `Text` | YAML strings, objects (serialized), list items that are booleans |
//! | `Number` | YAML integers and floats, `file.size`, `file.ctime`, `file.mtime` |
//! | `Bool` | YAML booleans (checkbox properties) |
//! | `List` | YAML sequences; nested sequences are flattened, nulls dropped |
//! | `Empty` | YAML null, missing keys |
//!
//! ## Type Inference
//!
//! Two places need a [`PropertyType`]: the property scan that feeds operator
//! choices to an editor, and runtime coercion here. Both go through
//! [`classify_text`] so the date heuristics cannot drift apart:
//!
//! - `^\d{4}-\d{2}-\d{2}$` → [`PropertyType::Date`]
//! - `^\d{4}-\d{2}-\d{2}T` → [`PropertyType::Datetime`]

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));
static DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T").expect("datetime pattern is valid"));
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number pattern is valid")
});

/// The kind of a property, as far as operator choice is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Text,
    Number,
    Date,
    Datetime,
    List,
    Checkbox,
    File,
    Unknown,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Number => "number",
            PropertyType::Date => "date",
            PropertyType::Datetime => "datetime",
            PropertyType::List => "list",
            PropertyType::Checkbox => "checkbox",
            PropertyType::File => "file",
            PropertyType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a string as a date, a datetime, or plain text.
pub fn classify_text(s: &str) -> PropertyType {
    if DATE_RE.is_match(s) {
        PropertyType::Date
    } else if DATETIME_RE.is_match(s) {
        PropertyType::Datetime
    } else {
        PropertyType::Text
    }
}

/// Parses a string that is entirely a decimal number (surrounding whitespace allowed).
///
/// Stricter than `f64::from_str`: `inf`, `NaN` and empty strings are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if !NUMBER_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Formats a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A resolved field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Items are always `Text` or `Number`.
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(items.into_iter().map(|s| FilterValue::Text(s.into())).collect())
    }

    /// Converts a frontmatter value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FilterValue::Empty,
            Value::Bool(b) => FilterValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(FilterValue::Number)
                .unwrap_or(FilterValue::Empty),
            Value::String(s) => FilterValue::Text(s.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                flatten_into(items, &mut out);
                FilterValue::List(out)
            }
            Value::Object(_) => FilterValue::Text(value.to_string()),
        }
    }

    /// Falsy in the loose sense: empty text, empty list, zero, `false`, or nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Empty => true,
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Number(n) => *n == 0.0 || n.is_nan(),
            FilterValue::Bool(b) => !b,
            FilterValue::List(items) => items.is_empty(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }

    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion: numbers as-is, text when it is entirely numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Runtime type of this value, using the same heuristics as the property scan.
    pub fn property_type(&self) -> PropertyType {
        match self {
            FilterValue::Empty => PropertyType::Unknown,
            FilterValue::Text(s) => classify_text(s),
            FilterValue::Number(_) => PropertyType::Number,
            FilterValue::Bool(_) => PropertyType::Checkbox,
            FilterValue::List(_) => PropertyType::List,
        }
    }
}

fn flatten_into(items: &[Value], out: &mut Vec<FilterValue>) {
    for item in items {
        match item {
            Value::Null => {}
            Value::Array(nested) => flatten_into(nested, out),
            Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    out.push(FilterValue::Number(n));
                }
            }
            Value::String(s) => out.push(FilterValue::Text(s.clone())),
            Value::Bool(b) => out.push(FilterValue::Text(b.to_string())),
            Value::Object(_) => out.push(FilterValue::Text(item.to_string())),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Empty => Ok(()),
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Number(n) => f.write_str(&format_number(*n)),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}
