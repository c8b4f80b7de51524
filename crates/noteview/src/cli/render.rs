//! Terminal formatting. Pure functions from data to strings; callers print.
//!
//! Styles come from `console`, which drops ANSI codes on its own when stdout
//! is not a terminal, so piped output and tests see plain text.

use console::{style, StyledObject};
use noteviewapp::properties::PropertyDef;
use noteviewapp::rules::{Condition, Filter, FilterGroup, GroupOperator};
use noteviewapp::views::ViewConfig;
use std::fmt::Write;
use std::path::Path;

fn index(position: usize) -> StyledObject<String> {
    style(format!("{}.", position + 1)).dim()
}

fn name(view: &ViewConfig) -> StyledObject<&str> {
    style(view.name.as_str()).bold()
}

fn id(view: &ViewConfig) -> StyledObject<&str> {
    style(view.id.as_str()).dim()
}

pub fn disabled() -> String {
    style("NoteView is disabled").yellow().to_string()
}

pub fn matched(position: usize, view: &ViewConfig) -> String {
    format!("{} {} {}", index(position), name(view), id(view))
}

pub fn no_match(path: &str) -> String {
    format!("{} {}", style("No view matches").yellow(), path)
}

pub fn added(position: usize, view: &ViewConfig) -> String {
    format!("{} {}", style("Added").green(), matched(position, view))
}

pub fn removed(view: &ViewConfig) -> String {
    format!("{} {} {}", style("Removed").red(), name(view), id(view))
}

pub fn wrote(path: &Path) -> String {
    format!("{} {}", style("Wrote").green(), path.display())
}

fn describe_filter(filter: &Filter) -> String {
    if filter.value.is_empty() {
        format!("{} {}", filter.field, filter.operator)
    } else {
        format!("{} {} {}", filter.field, filter.operator, filter.value)
    }
}

/// One-line rendering of a rule tree.
pub fn describe_rules(group: &FilterGroup) -> String {
    if group.conditions.is_empty() {
        return "always".to_string();
    }
    let parts: Vec<String> = group
        .conditions
        .iter()
        .map(|condition| match condition {
            Condition::Filter(filter) => describe_filter(filter),
            Condition::Group(inner) if inner.conditions.len() > 1 => {
                format!("({})", describe_rules(inner))
            }
            Condition::Group(inner) => describe_rules(inner),
        })
        .collect();
    match group.operator {
        GroupOperator::And => parts.join(" AND "),
        GroupOperator::Or => parts.join(" OR "),
        GroupOperator::Nor => format!("NOT ({})", parts.join(" OR ")),
    }
}

pub fn view_list(views: &[ViewConfig], enabled: bool) -> String {
    let mut out = String::new();
    if !enabled {
        let _ = writeln!(out, "{}", disabled());
    }
    if views.is_empty() {
        let _ = writeln!(out, "{}", style("No views").dim());
        return out;
    }
    for (position, view) in views.iter().enumerate() {
        let _ = writeln!(out, "{}", matched(position, view));
        let _ = writeln!(out, "   {}", style(describe_rules(&view.rules)).cyan());
    }
    out
}

pub fn properties(properties: &[PropertyDef]) -> String {
    let width = properties.iter().map(|p| p.key.len()).max().unwrap_or(0);
    let mut out = String::new();
    for property in properties {
        let operators: Vec<&str> = property.operators().iter().map(|op| op.name()).collect();
        let _ = writeln!(
            out,
            "{:width$}  {} {}",
            property.key,
            style(format!("{:9}", property.ty.as_str())).cyan(),
            style(operators.join(", ")).dim(),
            width = width
        );
    }
    out
}
