//! Placeholder parsing and value resolution.

use crate::document::DocumentContext;
use crate::filters::apply_filter_chain;
use crate::value::FilterValue;

/// A parsed `FIELD [INDEX] [| CHAIN]` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder<'a> {
    /// `{{content}}` / `{{file.content}}`: the rendered document body.
    Content,
    Field {
        key: &'a str,
        index: Option<usize>,
        chain: Option<&'a str>,
    },
}

impl<'a> Placeholder<'a> {
    pub fn parse(expr: &'a str) -> Self {
        let (head, chain) = match expr.split_once('|') {
            Some((head, chain)) => (head.trim(), Some(chain.trim()).filter(|c| !c.is_empty())),
            None => (expr.trim(), None),
        };

        if head == "content" || head == "file.content" {
            return Placeholder::Content;
        }

        let (key, index) = match head.strip_suffix(']').and_then(|h| h.rsplit_once('[')) {
            Some((key, digits)) => match digits.trim().parse::<usize>() {
                Ok(index) => (key.trim_end(), Some(index)),
                Err(_) => (head, None),
            },
            None => (head, None),
        };

        Placeholder::Field { key, index, chain }
    }
}

/// Resolves a key against the document. `file.*` names are built-ins; any
/// other key is a frontmatter lookup. Unknown keys resolve to `None`.
pub fn resolve_value(doc: &DocumentContext, key: &str) -> Option<FilterValue> {
    if let Some(builtin) = key.strip_prefix("file.") {
        return builtin_value(doc, builtin);
    }
    doc.frontmatter.get(key).map(FilterValue::from_json)
}

fn builtin_value(doc: &DocumentContext, name: &str) -> Option<FilterValue> {
    let file = &doc.file;
    Some(match name {
        "name" => FilterValue::text(&file.name),
        "basename" => FilterValue::text(&file.basename),
        "path" => FilterValue::text(&file.path),
        "folder" => FilterValue::text(&file.folder),
        "extension" => FilterValue::text(&file.extension),
        "size" => FilterValue::Number(file.size as f64),
        "ctime" => FilterValue::Number(file.ctime as f64),
        "mtime" => FilterValue::Number(file.mtime as f64),
        "tags" => FilterValue::list(doc.tags()),
        "aliases" => FilterValue::List(doc.aliases()),
        _ => return None,
    })
}

/// Fully evaluates a field placeholder to the string that gets substituted.
pub fn evaluate(doc: &DocumentContext, key: &str, index: Option<usize>, chain: Option<&str>) -> String {
    let Some(mut value) = resolve_value(doc, key) else {
        return String::new();
    };
    if let (Some(index), FilterValue::List(items)) = (index, &value) {
        match items.get(index) {
            Some(item) => value = item.clone(),
            None => return String::new(),
        }
    }
    if let Some(chain) = chain {
        value = apply_filter_chain(value, chain);
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileInfo;
    use serde_json::json;

    fn doc() -> DocumentContext {
        DocumentContext::new(
            FileInfo::from_path("Movies/Heat.md")
                .with_size(1234)
                .with_times(1_710_491_400_000, 1_710_540_600_000),
        )
        .with_frontmatter("title", "Heat")
        .with_frontmatter("cast", json!(["Pacino", "De Niro"]))
        .with_frontmatter("release date", "1995-12-15")
    }

    #[test]
    fn parses_key_index_and_chain() {
        assert_eq!(
            Placeholder::parse(" cast[1] | upper "),
            Placeholder::Field {
                key: "cast",
                index: Some(1),
                chain: Some("upper")
            }
        );
        assert_eq!(
            Placeholder::parse("release date"),
            Placeholder::Field {
                key: "release date",
                index: None,
                chain: None
            }
        );
        assert_eq!(Placeholder::parse(" content "), Placeholder::Content);
        assert_eq!(Placeholder::parse("file.content"), Placeholder::Content);
    }

    #[test]
    fn non_numeric_brackets_stay_in_the_key() {
        assert_eq!(
            Placeholder::parse("odd[key]"),
            Placeholder::Field {
                key: "odd[key]",
                index: None,
                chain: None
            }
        );
    }

    #[test]
    fn builtins_and_frontmatter() {
        let doc = doc();
        assert_eq!(evaluate(&doc, "file.basename", None, None), "Heat");
        assert_eq!(evaluate(&doc, "file.folder", None, None), "Movies");
        assert_eq!(evaluate(&doc, "file.size", None, None), "1234");
        assert_eq!(evaluate(&doc, "title", None, None), "Heat");
        assert_eq!(evaluate(&doc, "release date", None, None), "1995-12-15");
        assert_eq!(evaluate(&doc, "cast", None, None), "Pacino, De Niro");
    }

    #[test]
    fn unknown_keys_are_empty_and_skip_the_chain() {
        let doc = doc();
        assert_eq!(evaluate(&doc, "missing", None, Some("calc:+1")), "");
        assert_eq!(evaluate(&doc, "file.bogus", None, None), "");
    }

    #[test]
    fn index_selects_list_items() {
        let doc = doc();
        assert_eq!(evaluate(&doc, "cast", Some(0), None), "Pacino");
        assert_eq!(evaluate(&doc, "cast", Some(5), None), "");
        assert_eq!(evaluate(&doc, "title", Some(3), None), "Heat");
    }

    #[test]
    fn chain_runs_after_indexing() {
        let doc = doc();
        assert_eq!(evaluate(&doc, "cast", Some(1), Some("kebab")), "de-niro");
        assert_eq!(
            evaluate(&doc, "file.mtime", None, Some("date:\"YYYY-MM-DD\"")),
            "2024-03-15"
        );
    }
}
