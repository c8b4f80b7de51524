//! Rule tree evaluation.

use chrono::{DateTime, NaiveDate};
use std::cmp::Ordering;

use super::{Condition, Filter, FilterGroup, GroupOperator, Operator};
use crate::document::DocumentContext;
use crate::host::{link_path, LinkResolver};
use crate::value::{classify_text, parse_number, FilterValue, PropertyType};

/// Evaluates `group` against `doc`.
pub fn matches<R: LinkResolver + ?Sized>(
    group: &FilterGroup,
    doc: &DocumentContext,
    links: &R,
) -> bool {
    Matcher::new(doc, links).matches(group)
}

/// Evaluates rule trees against one document.
pub struct Matcher<'a, R: ?Sized> {
    doc: &'a DocumentContext,
    links: &'a R,
}

impl<'a, R: LinkResolver + ?Sized> Matcher<'a, R> {
    pub fn new(doc: &'a DocumentContext, links: &'a R) -> Self {
        Self { doc, links }
    }

    pub fn matches(&self, group: &FilterGroup) -> bool {
        if group.conditions.is_empty() {
            return true;
        }
        let mut results = group.conditions.iter().map(|c| self.condition(c));
        match group.operator {
            GroupOperator::And => results.all(|m| m),
            GroupOperator::Or => results.any(|m| m),
            GroupOperator::Nor => !results.any(|m| m),
        }
    }

    fn condition(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Filter(filter) => self.filter(filter),
            Condition::Group(group) => self.matches(group),
        }
    }

    pub fn filter(&self, filter: &Filter) -> bool {
        if filter.field == "file" {
            return self.file_operator(&filter.operator, &filter.value);
        }
        let target = self.resolve_field(&filter.field);
        let timestamp = is_timestamp_field(&filter.field);
        evaluate(&filter.operator, &target, &filter.value, timestamp)
    }

    /// Resolves a filter field to its current value.
    pub fn resolve_field(&self, field: &str) -> FilterValue {
        let file = &self.doc.file;
        match field {
            "file.name" => FilterValue::text(&file.name),
            "file.basename" => FilterValue::text(&file.basename),
            "file.path" => FilterValue::text(&file.path),
            "file.folder" => FilterValue::text(&file.folder),
            "file.extension" => FilterValue::text(&file.extension),
            "file.size" => FilterValue::Number(file.size as f64),
            "file.ctime" => FilterValue::Number(file.ctime as f64),
            "file.mtime" => FilterValue::Number(file.mtime as f64),
            "file tags" => FilterValue::list(self.doc.tags()),
            "aliases" => FilterValue::List(self.doc.aliases()),
            key => self
                .doc
                .frontmatter
                .get(key)
                .map(FilterValue::from_json)
                .unwrap_or_default(),
        }
    }

    fn file_operator(&self, op: &Operator, value: &str) -> bool {
        match op {
            Operator::LinksTo => self.links_to(value),
            Operator::DoesNotLinkTo => !self.links_to(value),
            Operator::InFolder => self.in_folder(value),
            Operator::IsNotInFolder => !self.in_folder(value),
            Operator::HasTag => self.has_tag(value).unwrap_or(false),
            Operator::DoesNotHaveTag => self.has_tag(value).map(|has| !has).unwrap_or(false),
            Operator::HasProperty => self.doc.frontmatter.contains_key(value.trim()),
            Operator::DoesNotHaveProperty => !self.doc.frontmatter.contains_key(value.trim()),
            _ => false,
        }
    }

    fn resolve_link_key(&self, link: &str) -> String {
        let resolved = self
            .links
            .resolve_link(link, &self.doc.file.path)
            .unwrap_or_else(|| link_path(link).to_string());
        link_key(&resolved)
    }

    fn links_to(&self, value: &str) -> bool {
        if link_path(value).is_empty() {
            return false;
        }
        let target = self.resolve_link_key(value);
        self.doc
            .links
            .iter()
            .chain(self.doc.frontmatter_links().iter())
            .any(|link| self.resolve_link_key(link) == target)
    }

    fn in_folder(&self, value: &str) -> bool {
        let folder = self.doc.file.folder.trim_matches('/');
        let target = value.trim().trim_matches('/');
        folder == target || folder.starts_with(&format!("{}/", target))
    }

    /// `None` when the filter value names no tags at all.
    fn has_tag(&self, value: &str) -> Option<bool> {
        let wanted = split_values(value)
            .into_iter()
            .map(|t| t.trim_start_matches('#').to_lowercase())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        if wanted.is_empty() {
            return None;
        }
        let tags = self
            .doc
            .tags()
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect::<Vec<_>>();
        Some(wanted.iter().any(|w| tags.iter().any(|t| tag_related(w, t))))
    }
}

/// Builtins whose numbers are millisecond timestamps.
fn is_timestamp_field(field: &str) -> bool {
    matches!(field, "file.ctime" | "file.mtime")
}

/// Tags match when equal or when one is an ancestor of the other.
fn tag_related(a: &str, b: &str) -> bool {
    a == b
        || b.strip_prefix(a).is_some_and(|rest| rest.starts_with('/'))
        || a.strip_prefix(b).is_some_and(|rest| rest.starts_with('/'))
}

fn link_key(path: &str) -> String {
    let path = path.trim().trim_start_matches('/');
    path.strip_suffix(".md").unwrap_or(path).to_string()
}

/// Splits a multi-value filter string on commas, trimming and dropping blanks.
pub(crate) fn split_values(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Applies a generic operator to a resolved value. Numbers only count as
/// dates when `timestamp` is set.
fn evaluate(op: &Operator, target: &FilterValue, value: &str, timestamp: bool) -> bool {
    match op {
        Operator::IsEmpty => target.is_empty(),
        Operator::IsNotEmpty => !target.is_empty(),
        Operator::Is => any_item(target, |s| s == value),
        Operator::IsNot => !any_item(target, |s| s == value),
        Operator::Contains => any_item(target, |s| s.contains(value)),
        Operator::DoesNotContain => !any_item(target, |s| s.contains(value)),
        Operator::ContainsAnyOf => contains_tokens(target, value, TokenMode::Any).unwrap_or(false),
        Operator::DoesNotContainAnyOf => contains_tokens(target, value, TokenMode::Any)
            .map(|m| !m)
            .unwrap_or(false),
        Operator::ContainsAllOf => contains_tokens(target, value, TokenMode::All).unwrap_or(false),
        Operator::DoesNotContainAllOf => contains_tokens(target, value, TokenMode::All)
            .map(|m| !m)
            .unwrap_or(false),
        Operator::StartsWith => scalar_text(target).is_some_and(|s| s.starts_with(value)),
        Operator::EndsWith => scalar_text(target).is_some_and(|s| s.ends_with(value)),
        Operator::Eq => compare_numbers(target, value).is_some_and(|o| o == Ordering::Equal),
        Operator::Ne => compare_numbers(target, value).is_some_and(|o| o != Ordering::Equal),
        Operator::Lt => compare_numbers(target, value).is_some_and(|o| o == Ordering::Less),
        Operator::Le => compare_numbers(target, value).is_some_and(|o| o != Ordering::Greater),
        Operator::Gt => compare_numbers(target, value).is_some_and(|o| o == Ordering::Greater),
        Operator::Ge => compare_numbers(target, value).is_some_and(|o| o != Ordering::Less),
        Operator::On => compare_days(target, value, timestamp).is_some_and(|o| o == Ordering::Equal),
        Operator::NotOn => compare_days(target, value, timestamp).is_some_and(|o| o != Ordering::Equal),
        Operator::Before => compare_days(target, value, timestamp).is_some_and(|o| o == Ordering::Less),
        Operator::OnOrBefore => compare_days(target, value, timestamp).is_some_and(|o| o != Ordering::Greater),
        Operator::After => compare_days(target, value, timestamp).is_some_and(|o| o == Ordering::Greater),
        Operator::OnOrAfter => compare_days(target, value, timestamp).is_some_and(|o| o != Ordering::Less),
        // file operators on a regular field, or an unknown operator
        _ => false,
    }
}

#[derive(Clone, Copy)]
enum TokenMode {
    Any,
    All,
}

/// `None` when the filter value has no tokens.
fn contains_tokens(target: &FilterValue, value: &str, mode: TokenMode) -> Option<bool> {
    let tokens = split_values(value);
    if tokens.is_empty() {
        return None;
    }
    let hit = |token: &&str| any_item(target, |s| s.contains(*token));
    Some(match mode {
        TokenMode::Any => tokens.iter().any(hit),
        TokenMode::All => tokens.iter().all(hit),
    })
}

/// Scalars test their string form; lists test each element.
fn any_item(target: &FilterValue, pred: impl Fn(&str) -> bool) -> bool {
    match target {
        FilterValue::List(items) => items.iter().any(|item| pred(&item.to_string())),
        scalar => pred(&scalar.to_string()),
    }
}

fn scalar_text(target: &FilterValue) -> Option<String> {
    match target {
        FilterValue::List(_) => None,
        scalar => Some(scalar.to_string()),
    }
}

fn compare_numbers(target: &FilterValue, value: &str) -> Option<Ordering> {
    let lhs = target.as_number()?;
    let rhs = parse_number(value)?;
    lhs.partial_cmp(&rhs)
}

fn compare_days(target: &FilterValue, value: &str, timestamp: bool) -> Option<Ordering> {
    let lhs = day_of(target, timestamp)?;
    let rhs = day_of_text(value)?;
    Some(lhs.cmp(&rhs))
}

/// Calendar day of a value. Timestamps are UTC milliseconds.
fn day_of(value: &FilterValue, timestamp: bool) -> Option<NaiveDate> {
    match value {
        FilterValue::Number(ms) if timestamp => {
            DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.date_naive())
        }
        FilterValue::Text(s) => day_of_text(s),
        _ => None,
    }
}

/// Day of a `YYYY-MM-DD` date or a datetime starting with one.
fn day_of_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if !matches!(classify_text(s), PropertyType::Date | PropertyType::Datetime) {
        return None;
    }
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileInfo;
    use crate::host::NoLinks;
    use crate::rules::Filter;
    use serde_json::json;

    fn doc() -> DocumentContext {
        DocumentContext::new(
            FileInfo::from_path("media/movies/Heat.md")
                .with_size(1200)
                // 2024-03-15T08:30:00Z and 2024-03-15T22:10:00Z
                .with_times(1_710_491_400_000, 1_710_540_600_000),
        )
        .with_frontmatter("status", "watched")
        .with_frontmatter("rating", 4.5)
        .with_frontmatter("genres", json!(["xa", "yb"]))
        .with_frontmatter("released", "1995-12-15")
        .with_frontmatter("director", "[[Michael Mann]]")
        .with_body_tag("#movies/action")
        .with_link("Al Pacino")
    }

    fn check(field: &str, op: Operator, value: &str) -> bool {
        let group = FilterGroup::and().with_filter(Filter::new(field, op, value));
        matches(&group, &doc(), &NoLinks)
    }

    #[test]
    fn empty_groups_match_at_any_depth() {
        let d = doc();
        assert!(matches(&FilterGroup::and(), &d, &NoLinks));
        assert!(matches(&FilterGroup::or(), &d, &NoLinks));
        assert!(matches(&FilterGroup::nor(), &d, &NoLinks));
        let nested = FilterGroup::or().with_group(FilterGroup::and().with_group(FilterGroup::nor()));
        assert!(matches(&nested, &d, &NoLinks));
    }

    #[test]
    fn nor_is_negated_or() {
        let d = doc();
        let children = vec![
            Condition::Filter(Filter::new("status", Operator::Is, "watched")),
            Condition::Filter(Filter::new("status", Operator::Is, "queued")),
        ];
        let or = FilterGroup {
            operator: GroupOperator::Or,
            conditions: children.clone(),
        };
        let nor = FilterGroup {
            operator: GroupOperator::Nor,
            conditions: children,
        };
        assert!(matches(&or, &d, &NoLinks));
        assert_eq!(matches(&nor, &d, &NoLinks), !matches(&or, &d, &NoLinks));
    }

    #[test]
    fn and_requires_all_children() {
        let group = FilterGroup::and()
            .with_filter(Filter::new("status", Operator::Is, "watched"))
            .with_filter(Filter::new("rating", Operator::Gt, "5"));
        assert!(!matches(&group, &doc(), &NoLinks));
    }

    #[test]
    fn is_and_contains_are_case_sensitive() {
        assert!(check("status", Operator::Is, "watched"));
        assert!(!check("status", Operator::Is, "Watched"));
        assert!(check("status", Operator::IsNot, "queued"));
        assert!(check("status", Operator::Contains, "atch"));
        assert!(!check("status", Operator::Contains, "ATCH"));
        assert!(check("status", Operator::DoesNotContain, "xyz"));
    }

    #[test]
    fn contains_all_and_any_of() {
        assert!(check("genres", Operator::ContainsAllOf, "a,b"));
        assert!(check("genres", Operator::ContainsAnyOf, "a, zzz"));
        assert!(!check("genres", Operator::ContainsAllOf, "a,zzz"));
        assert!(check("genres", Operator::DoesNotContainAnyOf, "q,r"));
        assert!(check("genres", Operator::DoesNotContainAllOf, "a,zzz"));

        let only_xa = DocumentContext::new(FileInfo::from_path("a.md"))
            .with_frontmatter("genres", json!(["xa"]));
        let all = FilterGroup::and().with_filter(Filter::new("genres", Operator::ContainsAllOf, "a,b"));
        let any = FilterGroup::and().with_filter(Filter::new("genres", Operator::ContainsAnyOf, "a,b"));
        assert!(!matches(&all, &only_xa, &NoLinks));
        assert!(matches(&any, &only_xa, &NoLinks));
    }

    #[test]
    fn multi_value_operators_need_tokens() {
        assert!(!check("genres", Operator::ContainsAnyOf, " , "));
        assert!(!check("genres", Operator::DoesNotContainAnyOf, ""));
        assert!(!check("missing", Operator::ContainsAllOf, ""));
    }

    #[test]
    fn starts_and_ends_with_are_scalar_only() {
        assert!(check("status", Operator::StartsWith, "wat"));
        assert!(check("status", Operator::EndsWith, "hed"));
        assert!(!check("genres", Operator::StartsWith, "x"));
        assert!(!check("genres", Operator::EndsWith, "b"));
    }

    #[test]
    fn missing_key_is_empty_string() {
        assert!(check("missing", Operator::IsEmpty, ""));
        assert!(check("missing", Operator::Is, ""));
        assert!(!check("missing", Operator::IsNotEmpty, ""));
        assert!(!check("missing", Operator::StartsWith, "a"));
    }

    #[test]
    fn numeric_comparisons() {
        assert!(check("rating", Operator::Gt, "4"));
        assert!(check("rating", Operator::Le, "4.5"));
        assert!(check("rating", Operator::Ne, "3"));
        assert!(!check("rating", Operator::Lt, "abc"));
        assert!(check("file.size", Operator::Ge, "1200"));
        assert!(!check("genres", Operator::Eq, "1"));
    }

    #[test]
    fn timestamp_fields_compare_by_calendar_day() {
        assert!(check("file.ctime", Operator::On, "2024-03-15"));
        assert!(check("file.mtime", Operator::On, "2024-03-15"));
        assert!(check("file.ctime", Operator::OnOrAfter, "2024-03-15"));
        assert!(!check("file.ctime", Operator::Before, "2024-03-15"));
        assert!(check("file.ctime", Operator::After, "2024-03-14"));
        assert!(check("file.mtime", Operator::NotOn, "2024-03-16"));
        assert!(check("file.ctime", Operator::On, "2024-03-15T23:59"));
    }

    #[test]
    fn timestamp_emptiness_uses_raw_value() {
        assert!(check("file.ctime", Operator::IsNotEmpty, ""));
        let blank = DocumentContext::new(FileInfo::from_path("a.md"));
        let group = FilterGroup::and().with_filter(Filter::new("file.mtime", Operator::IsEmpty, ""));
        assert!(matches(&group, &blank, &NoLinks));
    }

    #[test]
    fn frontmatter_dates_compare_by_day() {
        assert!(check("released", Operator::Before, "2000-01-01"));
        assert!(check("released", Operator::On, "1995-12-15"));
        assert!(!check("released", Operator::On, "not a date"));
    }

    #[test]
    fn plain_numbers_are_not_dates() {
        assert!(!check("rating", Operator::Before, "2000-01-01"));
        assert!(!check("rating", Operator::On, "1970-01-01"));
        assert!(!check("rating", Operator::NotOn, "1970-01-01"));
        assert!(!check("file.size", Operator::After, "1960-01-01"));
    }

    #[test]
    fn date_text_must_be_a_whole_date() {
        let d = DocumentContext::new(FileInfo::from_path("a.md"))
            .with_frontmatter("due", "2024-03-15abc")
            .with_frontmatter("at", "2024-03-15T10:00");
        let on = |field: &str| {
            FilterGroup::and().with_filter(Filter::new(field, Operator::On, "2024-03-15"))
        };
        assert!(!matches(&on("due"), &d, &NoLinks));
        assert!(matches(&on("at"), &d, &NoLinks));
        assert!(!check("file.ctime", Operator::On, "2024-03-15xyz"));
    }

    #[test]
    fn builtin_fields() {
        assert!(check("file.name", Operator::Is, "Heat.md"));
        assert!(check("file.basename", Operator::Is, "Heat"));
        assert!(check("file.folder", Operator::Is, "media/movies"));
        assert!(check("file.extension", Operator::Is, "md"));
        assert!(check("file.path", Operator::StartsWith, "media/"));
    }

    #[test]
    fn has_tag_is_hierarchical() {
        assert!(check("file", Operator::HasTag, "movies"));
        assert!(check("file", Operator::HasTag, "#movies/action"));
        assert!(check("file", Operator::HasTag, "Movies"));
        assert!(!check("file", Operator::HasTag, "movie"));
        assert!(!check("file", Operator::HasTag, "movies/drama"));
        assert!(check("file", Operator::DoesNotHaveTag, "books"));
        assert!(!check("file", Operator::DoesNotHaveTag, ""));

        let parent_only = DocumentContext::new(FileInfo::from_path("a.md")).with_body_tag("#movies");
        let child = FilterGroup::and().with_filter(Filter::new("file", Operator::HasTag, "movies/action"));
        assert!(matches(&child, &parent_only, &NoLinks));
    }

    #[test]
    fn file_tags_field_unions_sources() {
        let d = doc().with_frontmatter("tags", json!(["#watchlist"]));
        let group = FilterGroup::and().with_filter(Filter::new("file tags", Operator::Contains, "watchlist"));
        assert!(matches(&group, &d, &NoLinks));
    }

    #[test]
    fn in_folder_requires_segment_boundary() {
        assert!(check("file", Operator::InFolder, "media"));
        assert!(check("file", Operator::InFolder, "/media/movies/"));
        assert!(!check("file", Operator::InFolder, "med"));
        assert!(check("file", Operator::IsNotInFolder, "books"));
    }

    #[test]
    fn has_property_checks_keys_only() {
        let d = doc().with_frontmatter("cover", json!(null));
        let has = FilterGroup::and().with_filter(Filter::new("file", Operator::HasProperty, "cover"));
        assert!(matches(&has, &d, &NoLinks));
        assert!(check("file", Operator::DoesNotHaveProperty, "cover"));
    }

    #[test]
    fn links_to_uses_body_and_frontmatter_links() {
        assert!(check("file", Operator::LinksTo, "Al Pacino"));
        assert!(check("file", Operator::LinksTo, "Michael Mann"));
        assert!(check("file", Operator::DoesNotLinkTo, "Robert De Niro"));
        assert!(!check("file", Operator::LinksTo, ""));
    }

    #[test]
    fn links_to_reaches_nested_frontmatter_arrays() {
        let d = DocumentContext::new(FileInfo::from_path("a.md"))
            .with_frontmatter("related", json!([["[[Deep Note]]"], "x [[Other|o]]"]));
        let links = |target: &str| {
            FilterGroup::and().with_filter(Filter::new("file", Operator::LinksTo, target))
        };
        assert!(matches(&links("Deep Note"), &d, &NoLinks));
        assert!(matches(&links("Other"), &d, &NoLinks));
        assert!(!matches(&links("o"), &d, &NoLinks));
    }

    #[test]
    fn links_to_resolves_through_host() {
        let resolver = |link: &str, _from: &str| Some(format!("people/{}.md", link_path(link)));
        let group =
            FilterGroup::and().with_filter(Filter::new("file", Operator::LinksTo, "Michael Mann#Career"));
        assert!(matches(&group, &doc(), &resolver));
    }

    #[test]
    fn invalid_operators_never_match() {
        assert!(!check("status", Operator::Other("resembles".into()), "watched"));
        assert!(!check("status", Operator::HasTag, "movies"));
        assert!(!check("file", Operator::Is, "Heat"));
    }

    #[test]
    fn aliases_field() {
        let d = doc().with_frontmatter("aliases", json!(["Heat (1995)"]));
        let group = FilterGroup::and().with_filter(Filter::new("aliases", Operator::Contains, "1995"));
        assert!(matches(&group, &d, &NoLinks));
    }
}
