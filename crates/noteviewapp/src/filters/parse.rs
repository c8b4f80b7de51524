//! Chain and argument scanners.

use super::FilterArg;
use crate::value::parse_number;

/// Splits on `sep` wherever it is not inside a `"` or `'` quoted span.
fn split_unquoted(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == sep => {
                parts.push(&input[start..idx]);
                start = idx + ch.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Splits a filter chain into trimmed, non-empty steps.
pub fn split_chain(chain: &str) -> Vec<&str> {
    split_unquoted(chain, '|')
        .into_iter()
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .collect()
}

/// Splits a step on its first `:` into `(name, raw args)`.
pub fn split_step(step: &str) -> (&str, &str) {
    match step.split_once(':') {
        Some((name, args)) => (name.trim(), args.trim()),
        None => (step.trim(), ""),
    }
}

/// Parses the raw argument string of a step.
pub fn parse_args(raw: &str) -> Vec<FilterArg> {
    let mut raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('(') && raw.ends_with(')') {
        raw = raw[1..raw.len() - 1].trim();
    }
    if raw.is_empty() {
        return Vec::new();
    }
    split_unquoted(raw, ',')
        .into_iter()
        .map(|piece| {
            let text = unquote(piece.trim());
            match parse_number(text) {
                Some(value) => FilterArg::Number {
                    value,
                    raw: text.to_string(),
                },
                None => FilterArg::Text(text.to_string()),
            }
        })
        .collect()
}

/// Strips one layer of matching `"` or `'` quotes.
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
