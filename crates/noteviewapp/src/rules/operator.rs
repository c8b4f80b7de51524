//! Filter operators.
//!
//! Operators persist as their human-readable names (`"contains any of"`, `"≤"`).
//! A name that is not recognized survives as [`Operator::Other`] so settings
//! written by a newer version round-trip untouched; matching treats it as a
//! non-match.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::PropertyType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    // --- generic ---
    IsEmpty,
    IsNotEmpty,
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    ContainsAnyOf,
    DoesNotContainAnyOf,
    ContainsAllOf,
    DoesNotContainAllOf,
    StartsWith,
    EndsWith,

    // --- numeric ---
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // --- calendar day ---
    On,
    NotOn,
    Before,
    OnOrBefore,
    After,
    OnOrAfter,

    // --- the `file` pseudo-field ---
    LinksTo,
    DoesNotLinkTo,
    InFolder,
    IsNotInFolder,
    HasTag,
    DoesNotHaveTag,
    HasProperty,
    DoesNotHaveProperty,

    /// Unrecognized name, kept verbatim.
    Other(String),
}

const NAMES: &[(Operator, &str)] = &[
    (Operator::IsEmpty, "is empty"),
    (Operator::IsNotEmpty, "is not empty"),
    (Operator::Is, "is"),
    (Operator::IsNot, "is not"),
    (Operator::Contains, "contains"),
    (Operator::DoesNotContain, "does not contain"),
    (Operator::ContainsAnyOf, "contains any of"),
    (Operator::DoesNotContainAnyOf, "does not contain any of"),
    (Operator::ContainsAllOf, "contains all of"),
    (Operator::DoesNotContainAllOf, "does not contain all of"),
    (Operator::StartsWith, "starts with"),
    (Operator::EndsWith, "ends with"),
    (Operator::Eq, "="),
    (Operator::Ne, "≠"),
    (Operator::Lt, "<"),
    (Operator::Le, "≤"),
    (Operator::Gt, ">"),
    (Operator::Ge, "≥"),
    (Operator::On, "on"),
    (Operator::NotOn, "not on"),
    (Operator::Before, "before"),
    (Operator::OnOrBefore, "on or before"),
    (Operator::After, "after"),
    (Operator::OnOrAfter, "on or after"),
    (Operator::LinksTo, "links to"),
    (Operator::DoesNotLinkTo, "does not link to"),
    (Operator::InFolder, "in folder"),
    (Operator::IsNotInFolder, "is not in folder"),
    (Operator::HasTag, "has tag"),
    (Operator::DoesNotHaveTag, "does not have tag"),
    (Operator::HasProperty, "has property"),
    (Operator::DoesNotHaveProperty, "does not have property"),
];

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::ContainsAnyOf,
    Operator::DoesNotContainAnyOf,
    Operator::ContainsAllOf,
    Operator::DoesNotContainAllOf,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const LIST_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::ContainsAnyOf,
    Operator::DoesNotContainAnyOf,
    Operator::ContainsAllOf,
    Operator::DoesNotContainAllOf,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Lt,
    Operator::Le,
    Operator::Gt,
    Operator::Ge,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::On,
    Operator::NotOn,
    Operator::Before,
    Operator::OnOrBefore,
    Operator::After,
    Operator::OnOrAfter,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const CHECKBOX_OPERATORS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

const FILE_OPERATORS: &[Operator] = &[
    Operator::LinksTo,
    Operator::DoesNotLinkTo,
    Operator::InFolder,
    Operator::IsNotInFolder,
    Operator::HasTag,
    Operator::DoesNotHaveTag,
    Operator::HasProperty,
    Operator::DoesNotHaveProperty,
];

/// Operators an editor should offer for a property of the given type.
pub fn operators_for(ty: PropertyType) -> &'static [Operator] {
    match ty {
        PropertyType::Text | PropertyType::Unknown => TEXT_OPERATORS,
        PropertyType::List => LIST_OPERATORS,
        PropertyType::Number => NUMBER_OPERATORS,
        PropertyType::Date | PropertyType::Datetime => DATE_OPERATORS,
        PropertyType::Checkbox => CHECKBOX_OPERATORS,
        PropertyType::File => FILE_OPERATORS,
    }
}

impl Operator {
    pub fn name(&self) -> &str {
        match self {
            Operator::Other(name) => name,
            known => NAMES
                .iter()
                .find(|(op, _)| op == known)
                .map(|(_, name)| *name)
                .unwrap_or(""),
        }
    }

    pub fn parse(name: &str) -> Self {
        NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(op, _)| op.clone())
            .unwrap_or_else(|| Operator::Other(name.to_string()))
    }

    pub fn is_valid_for(&self, ty: PropertyType) -> bool {
        operators_for(ty).contains(self)
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            Operator::On
                | Operator::NotOn
                | Operator::Before
                | Operator::OnOrBefore
                | Operator::After
                | Operator::OnOrAfter
        )
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::parse(&name)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.name().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
