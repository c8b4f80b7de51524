//! Filters that emit markdown syntax.

use super::registry::arg_str;
use super::{FilterArg, FilterError};
use crate::value::FilterValue;

type FilterResult = Result<FilterValue, FilterError>;

/// Formats every item of a list (or the scalar itself) and joins the results.
fn emit(value: &FilterValue, sep: &str, f: impl Fn(&str) -> String) -> FilterValue {
    match value {
        FilterValue::Empty => FilterValue::Empty,
        FilterValue::List(items) => FilterValue::Text(
            items
                .iter()
                .map(|item| f(&item.to_string()))
                .collect::<Vec<_>>()
                .join(sep),
        ),
        other => FilterValue::Text(f(&other.to_string())),
    }
}

/// `[[target]]` or `[[target|alias]]`.
pub fn wikilink(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let alias = arg_str(args, 0).filter(|a| !a.is_empty());
    Ok(emit(value, ", ", |target| match alias {
        Some(alias) => format!("[[{}|{}]]", target, alias),
        None => format!("[[{}]]", target),
    }))
}

/// `[text](url)`; text defaults to the url.
pub fn link(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let text = arg_str(args, 0).filter(|t| !t.is_empty());
    Ok(emit(value, ", ", |url| {
        format!("[{}]({})", text.unwrap_or(url), url.replace(' ', "%20"))
    }))
}

/// `![alt](url)`, one per line for lists.
pub fn image(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let alt = arg_str(args, 0).unwrap_or("");
    Ok(emit(value, "\n", |url| {
        format!("![{}]({})", alt, url.replace(' ', "%20"))
    }))
}

pub fn blockquote(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    let source = match value {
        FilterValue::Empty => return Ok(FilterValue::Empty),
        FilterValue::List(items) => items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };
    Ok(FilterValue::Text(
        source
            .lines()
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(s: &str) -> Vec<FilterArg> {
        vec![FilterArg::Text(s.to_string())]
    }

    #[test]
    fn wikilinks() {
        assert_eq!(
            wikilink(&FilterValue::text("Note"), &[]).unwrap(),
            FilterValue::text("[[Note]]")
        );
        assert_eq!(
            wikilink(&FilterValue::text("Note"), &arg("see")).unwrap(),
            FilterValue::text("[[Note|see]]")
        );
        assert_eq!(
            wikilink(&FilterValue::list(["A", "B"]), &[]).unwrap(),
            FilterValue::text("[[A]], [[B]]")
        );
    }

    #[test]
    fn links_encode_spaces() {
        assert_eq!(
            link(&FilterValue::text("My Note.md"), &[]).unwrap(),
            FilterValue::text("[My Note.md](My%20Note.md)")
        );
        assert_eq!(
            link(&FilterValue::text("https://x.dev"), &arg("site")).unwrap(),
            FilterValue::text("[site](https://x.dev)")
        );
    }

    #[test]
    fn images_join_with_newlines() {
        assert_eq!(
            image(&FilterValue::list(["a.png", "b.png"]), &arg("pic")).unwrap(),
            FilterValue::text("![pic](a.png)\n![pic](b.png)")
        );
    }

    #[test]
    fn blockquote_prefixes_every_line() {
        assert_eq!(
            blockquote(&FilterValue::text("one\ntwo"), &[]).unwrap(),
            FilterValue::text("> one\n> two")
        );
        assert_eq!(
            blockquote(&FilterValue::list(["a", "b"]), &[]).unwrap(),
            FilterValue::text("> a\n> b")
        );
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(wikilink(&FilterValue::Empty, &[]).unwrap(), FilterValue::Empty);
        assert_eq!(blockquote(&FilterValue::Empty, &[]).unwrap(), FilterValue::Empty);
    }
}
