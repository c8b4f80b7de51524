//! The fixed filter registry.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{date, list, markdown, text, FilterArg, FilterError};
use crate::value::FilterValue;

/// Signature shared by every filter: a pure function of value and args.
pub type FilterFn = fn(&FilterValue, &[FilterArg]) -> Result<FilterValue, FilterError>;

static REGISTRY: Lazy<HashMap<&'static str, FilterFn>> = Lazy::new(|| {
    let entries: [(&'static str, FilterFn); 23] = [
        ("date", date::date),
        ("date_modify", date::date_modify),
        ("capitalize", text::capitalize),
        ("upper", text::upper),
        ("lower", text::lower),
        ("title", text::title),
        ("camel", text::camel),
        ("kebab", text::kebab),
        ("snake", text::snake),
        ("trim", text::trim),
        ("replace", text::replace),
        ("strip_tags", text::strip_tags),
        ("wikilink", markdown::wikilink),
        ("link", markdown::link),
        ("image", markdown::image),
        ("blockquote", markdown::blockquote),
        ("split", list::split),
        ("join", list::join),
        ("first", list::first),
        ("last", list::last),
        ("slice", list::slice),
        ("count", list::count),
        ("calc", list::calc),
    ];
    entries.into_iter().collect()
});

pub fn lookup(name: &str) -> Option<FilterFn> {
    REGISTRY.get(name).copied()
}

/// Registered filter names, sorted.
pub fn filter_names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Applies `f` to text, element-wise for lists; other values pass through.
pub(super) fn map_text(value: &FilterValue, f: impl Fn(&str) -> String) -> FilterValue {
    match value {
        FilterValue::Text(s) => FilterValue::Text(f(s)),
        FilterValue::List(items) => FilterValue::List(
            items
                .iter()
                .map(|item| match item {
                    FilterValue::Text(s) => FilterValue::Text(f(s)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Fallible variant of [`map_text`].
pub(super) fn try_map_text(
    value: &FilterValue,
    f: impl Fn(&str) -> Result<String, FilterError>,
) -> Result<FilterValue, FilterError> {
    Ok(match value {
        FilterValue::Text(s) => FilterValue::Text(f(s)?),
        FilterValue::List(items) => FilterValue::List(
            items
                .iter()
                .map(|item| match item {
                    FilterValue::Text(s) => f(s).map(FilterValue::Text),
                    other => Ok(other.clone()),
                })
                .collect::<Result<_, _>>()?,
        ),
        other => other.clone(),
    })
}

pub(super) fn arg_str(args: &[FilterArg], idx: usize) -> Option<&str> {
    args.get(idx).map(FilterArg::as_str)
}
