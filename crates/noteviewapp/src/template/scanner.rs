//! Single-pass placeholder scanner.

/// A run of template text or a `{{ ... }}` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Placeholder {
        /// The text between the braces, untrimmed.
        expr: &'a str,
        /// An odd number of unescaped `"` or `'` precedes the placeholder.
        in_attribute: bool,
    },
}

/// Quote parity over everything scanned so far, placeholder text included.
#[derive(Debug, Default, Clone, Copy)]
struct QuoteState {
    double_open: bool,
    single_open: bool,
    escaped: bool,
}

impl QuoteState {
    fn feed(&mut self, text: &str) {
        for ch in text.chars() {
            if self.escaped {
                self.escaped = false;
                continue;
            }
            match ch {
                '\\' => self.escaped = true,
                '"' => self.double_open = !self.double_open,
                '\'' => self.single_open = !self.single_open,
                _ => {}
            }
        }
    }

    fn in_attribute(&self) -> bool {
        self.double_open || self.single_open
    }
}

/// Splits `template` into text and placeholders, in order.
///
/// An opening `{{` with no closing `}}` is left as text.
pub fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut quotes = QuoteState::default();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        let before = &rest[..open];
        if !before.is_empty() {
            quotes.feed(before);
            segments.push(Segment::Text(before));
        }
        let expr = &rest[open + 2..open + 2 + close];
        segments.push(Segment::Placeholder {
            expr,
            in_attribute: quotes.in_attribute(),
        });
        quotes.feed(expr);
        rest = &rest[open + 2 + close + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(template: &str) -> Vec<(&str, bool)> {
        scan(template)
            .into_iter()
            .filter_map(|s| match s {
                Segment::Placeholder { expr, in_attribute } => Some((expr, in_attribute)),
                Segment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn text_and_placeholders_alternate() {
        assert_eq!(
            scan("a {{x}} b"),
            vec![
                Segment::Text("a "),
                Segment::Placeholder {
                    expr: "x",
                    in_attribute: false
                },
                Segment::Text(" b"),
            ]
        );
    }

    #[test]
    fn attribute_context_follows_quote_parity() {
        assert_eq!(
            contexts(r#"<img src="{{cover}}"> <p>{{cover}}</p> <a title='{{t}}'>"#),
            vec![("cover", true), ("cover", false), ("t", true)]
        );
    }

    #[test]
    fn escaped_quotes_do_not_count() {
        assert_eq!(contexts(r#"say \"hi {{x}}"#), vec![("x", false)]);
    }

    #[test]
    fn quotes_inside_earlier_placeholders_are_balanced() {
        assert_eq!(
            contexts(r#"{{ d | date:"YYYY" }} <b>{{y}}</b>"#),
            vec![(r#" d | date:"YYYY" "#, false), ("y", false)]
        );
    }

    #[test]
    fn unclosed_braces_are_text() {
        assert_eq!(scan("a {{ b"), vec![Segment::Text("a {{ b")]);
    }

    #[test]
    fn adjacent_placeholders() {
        assert_eq!(contexts("{{a}}{{b}}"), vec![("a", false), ("b", false)]);
    }
}
