//! # Rule Matching
//!
//! A view's rules are a tree: [`FilterGroup`] nodes combine children with
//! `AND`, `OR` or `NOR`, and [`Filter`] leaves compare one field against a value
//! string. [`matches`] evaluates the whole tree against a [`DocumentContext`].
//!
//! ## Semantics
//!
//! | Group | True when |
//! |-------|-----------|
//! | `AND` | every child matches |
//! | `OR`  | at least one child matches |
//! | `NOR` | no child matches (the negation of `OR`) |
//!
//! A group with no conditions matches everything, at any depth. This is what
//! makes a catch-all fallback view possible.
//!
//! Matching is total: unknown operators, operators that make no sense for the
//! resolved value's shape, and missing fields all make the leaf `false`.
//!
//! ## Case Sensitivity
//!
//! Text comparisons (`is`, `contains`, `starts with`, ...) are case-sensitive.
//! Tag comparisons (`has tag`) are case-insensitive, like tags in the host.
//!
//! ## Persisted Form
//!
//! ```json
//! { "operator": "AND", "conditions": [
//!     { "type": "filter", "field": "file.folder", "operator": "is", "value": "media" },
//!     { "type": "group", "operator": "NOR", "conditions": [] }
//! ] }
//! ```
//!
//! [`DocumentContext`]: crate::document::DocumentContext

mod matcher;
mod operator;

use serde::{Deserialize, Serialize};

pub use matcher::{matches, Matcher};
pub use operator::{operators_for, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
    Nor,
}

/// A leaf condition: `field operator value`.
///
/// `value` is always a string; multi-value operators split it on commas when
/// they evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    Filter(Filter),
    Group(FilterGroup),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterGroup {
    #[serde(default)]
    pub operator: GroupOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl FilterGroup {
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(GroupOperator::And)
    }

    pub fn or() -> Self {
        Self::new(GroupOperator::Or)
    }

    pub fn nor() -> Self {
        Self::new(GroupOperator::Nor)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.conditions.push(Condition::Filter(filter));
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.conditions.push(Condition::Group(group));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
