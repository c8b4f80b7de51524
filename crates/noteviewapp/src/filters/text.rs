//! Case, whitespace, replacement and tag-stripping filters.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::registry::{arg_str, map_text, try_map_text};
use super::{FilterArg, FilterError};
use crate::value::FilterValue;

type FilterResult = Result<FilterValue, FilterError>;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*>").expect("tag pattern is valid")
});
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern is valid"));

pub fn capitalize(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, capitalize_word))
}

pub fn upper(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, str::to_uppercase))
}

pub fn lower(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, str::to_lowercase))
}

pub fn title(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, |s| {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for ch in s.chars() {
            if ch.is_whitespace() {
                at_word_start = true;
                out.push(ch);
            } else if at_word_start {
                at_word_start = false;
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        out
    }))
}

pub fn camel(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, |s| {
        split_words(s)
            .iter()
            .enumerate()
            .map(|(i, w)| {
                if i == 0 {
                    w.to_lowercase()
                } else {
                    capitalize_word(w)
                }
            })
            .collect()
    }))
}

pub fn kebab(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, |s| join_lower(s, "-")))
}

pub fn snake(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, |s| join_lower(s, "_")))
}

pub fn trim(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(map_text(value, |s| s.trim().to_string()))
}

/// `replace(search, replacement = "")`.
///
/// `search` written as `/pattern/flags` is a regex (flags `i`, `m`, `s`, `x`;
/// `g` and `u` are accepted and implied); anything else is literal. Every
/// occurrence is replaced.
pub fn replace(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let search = arg_str(args, 0)
        .ok_or_else(|| FilterError::argument("replace", "missing search argument"))?;
    let replacement = arg_str(args, 1).unwrap_or("");

    match regex_literal(search) {
        Some((pattern, flags)) => {
            let re = build_regex(pattern, flags)?;
            let replacement = expand_template(replacement, re.captures_len());
            Ok(map_text(value, |s| re.replace_all(s, replacement.as_str()).into_owned()))
        }
        None => {
            if search.is_empty() {
                return Ok(value.clone());
            }
            try_map_text(value, |s| Ok(s.replace(search, replacement)))
        }
    }
}

/// Rewrites `$1`, `$&` and `$<name>` references into `regex` syntax.
///
/// `$12` refers to group 12 only when the pattern has that many groups,
/// otherwise to group 1 followed by `2`. Anything else after a `$` stays literal.
fn expand_template(replacement: &str, groups: usize) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take(2).take_while(u8::is_ascii_digit).count();
        let two = (digits == 2)
            .then(|| after[..2].parse::<usize>().ok())
            .flatten()
            .filter(|n| *n > 0 && *n < groups);
        let one = (digits >= 1)
            .then(|| after[..1].parse::<usize>().ok())
            .flatten()
            .filter(|n| *n > 0 && *n < groups);
        rest = if let Some(n) = two {
            out.push_str(&format!("${{{}}}", n));
            &after[2..]
        } else if let Some(n) = one {
            out.push_str(&format!("${{{}}}", n));
            &after[1..]
        } else if let Some(tail) = after.strip_prefix('&') {
            out.push_str("${0}");
            tail
        } else if let Some((name, tail)) = after
            .strip_prefix('<')
            .and_then(|named| named.split_once('>'))
        {
            out.push_str(&format!("${{{}}}", name));
            tail
        } else if let Some(tail) = after.strip_prefix('$') {
            out.push_str("$$");
            tail
        } else {
            out.push_str("$$");
            after
        };
    }
    out.push_str(rest);
    out
}

/// Text content of an HTML fragment. Tags named in `keep` (comma separated,
/// any number of args) survive untouched.
pub fn strip_tags(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let keep: Vec<String> = args
        .iter()
        .flat_map(|arg| arg.as_str().split(','))
        .map(|name| {
            name.trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_lowercase()
        })
        .filter(|name| !name.is_empty())
        .collect();

    Ok(map_text(value, |s| {
        let stripped = TAG_RE.replace_all(s, |caps: &regex::Captures| match caps.get(1) {
            Some(name) if keep.contains(&name.as_str().to_lowercase()) => caps[0].to_string(),
            _ => String::new(),
        });
        decode_entities(&stripped)
    }))
}

fn regex_literal(search: &str) -> Option<(&str, &str)> {
    let rest = search.strip_prefix('/')?;
    let last = rest.rfind('/')?;
    Some((&rest[..last], &rest[last + 1..]))
}

fn build_regex(pattern: &str, flags: &str) -> Result<Regex, FilterError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'g' | 'u' => &mut builder,
            other => return Err(FilterError::UnsupportedFlag(other)),
        };
    }
    builder.build().map_err(|source| FilterError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn decode_entities(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => body
                    .strip_prefix("#x")
                    .or_else(|| body.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| body.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn capitalize_word(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn join_lower(s: &str, sep: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Word boundaries: any non-alphanumeric run, a lower→upper step (`fooBar`),
/// the end of a capital run before a capitalized word (`XMLHttp`), and a
/// digit→letter step (`v2beta`).
pub(super) fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(&prev) = chars.get(i.wrapping_sub(1)).filter(|_| !current.is_empty()) {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && ch.is_uppercase())
                || (prev.is_uppercase()
                    && ch.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()))
                || (prev.is_numeric() && ch.is_alphabetic());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FilterValue {
        FilterValue::text(s)
    }

    fn args(items: &[&str]) -> Vec<FilterArg> {
        items.iter().map(|s| FilterArg::Text(s.to_string())).collect()
    }

    #[test]
    fn word_splitting_heuristic() {
        assert_eq!(split_words("Hello World"), vec!["Hello", "World"]);
        assert_eq!(split_words("fooBarBaz"), vec!["foo", "Bar", "Baz"]);
        assert_eq!(split_words("XMLHttpRequest"), vec!["XML", "Http", "Request"]);
        assert_eq!(split_words("snake_case-and kebab"), vec!["snake", "case", "and", "kebab"]);
        assert_eq!(split_words("v2beta"), vec!["v2", "beta"]);
    }

    #[test]
    fn case_filters() {
        assert_eq!(kebab(&text("Hello World"), &[]).unwrap(), text("hello-world"));
        assert_eq!(snake(&text("fooBar baz"), &[]).unwrap(), text("foo_bar_baz"));
        assert_eq!(camel(&text("hello big world"), &[]).unwrap(), text("helloBigWorld"));
        assert_eq!(capitalize(&text("hELLO"), &[]).unwrap(), text("Hello"));
        assert_eq!(title(&text("the  great GATSBY"), &[]).unwrap(), text("The  Great Gatsby"));
    }

    #[test]
    fn case_filters_map_lists() {
        let list = FilterValue::list(["a", "b"]);
        assert_eq!(upper(&list, &[]).unwrap(), FilterValue::list(["A", "B"]));
    }

    #[test]
    fn non_text_passes_through() {
        assert_eq!(upper(&FilterValue::Number(3.0), &[]).unwrap(), FilterValue::Number(3.0));
    }

    #[test]
    fn replace_literal_is_global_and_escaped() {
        assert_eq!(
            replace(&text("a.b.c"), &args(&[".", "-"])).unwrap(),
            text("a-b-c")
        );
        assert_eq!(replace(&text("a.b"), &args(&["."])).unwrap(), text("ab"));
    }

    #[test]
    fn replace_regex_with_flags() {
        assert_eq!(
            replace(&text("Foo foo FOO"), &args(&["/foo/gi", "x"])).unwrap(),
            text("x x x")
        );
        assert_eq!(
            replace(&text("a1b22"), &args(&["/\\d+/", "#"])).unwrap(),
            text("a#b#")
        );
        assert_eq!(
            replace(&text("2024-03-01"), &args(&["/(\\d+)-(\\d+)-(\\d+)/", "$3.$2.$1"])).unwrap(),
            text("01.03.2024")
        );
    }

    #[test]
    fn replace_group_references_end_at_the_digit() {
        assert_eq!(
            replace(&text("ab"), &args(&["/(a)(b)/", "$1x$2"])).unwrap(),
            text("axb")
        );
        assert_eq!(
            replace(&text("ab"), &args(&["/(a)b/", "$12|$&|$$|$9"])).unwrap(),
            text("a2|ab|$|$9")
        );
        assert_eq!(
            replace(&text("2024-03"), &args(&["/(?<y>\\d+)-(?<m>\\d+)/", "$<m>/$<y>"])).unwrap(),
            text("03/2024")
        );
    }

    #[test]
    fn replace_errors() {
        assert!(matches!(
            replace(&text("x"), &args(&["/(/"])),
            Err(FilterError::InvalidRegex { .. })
        ));
        assert!(matches!(
            replace(&text("x"), &args(&["/x/q"])),
            Err(FilterError::UnsupportedFlag('q'))
        ));
        assert!(replace(&text("x"), &[]).is_err());
    }

    #[test]
    fn strip_tags_returns_text() {
        assert_eq!(
            strip_tags(&text("<p>Hello <b>bold</b> &amp; <!-- c -->done</p>"), &[]).unwrap(),
            text("Hello bold & done")
        );
    }

    #[test]
    fn strip_tags_keeps_allowlisted_tags() {
        assert_eq!(
            strip_tags(&text("<p>Hi <b>there</b> <i>you</i></p>"), &args(&["b,i"])).unwrap(),
            text("Hi <b>there</b> <i>you</i>")
        );
        assert_eq!(
            strip_tags(&text("<p>Hi <B>x</B></p>"), &args(&["b"])).unwrap(),
            text("Hi <B>x</B>")
        );
    }

    #[test]
    fn entities_decode() {
        assert_eq!(decode_entities("&#65;&#x42;&lt;&unknown;"), "AB<&unknown;");
    }
}
