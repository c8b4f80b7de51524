//! Rendered markup and the scripts it carries.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script pattern is valid")
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

/// A `<script>` element found in rendered markup.
///
/// Nothing in this crate runs scripts. A host that chooses to should create a
/// fresh element per entry, copy `attributes`, and use `source` as its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateScript {
    pub attributes: Vec<(String, String)>,
    /// Inline text wrapped as `(function() { ... })();`, or `None` for
    /// scripts with no inline body (typically `src=` scripts).
    pub source: Option<String>,
}

impl TemplateScript {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The result of rendering a view's template for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub view_id: String,
    /// Final markup. Script elements are left in place.
    pub html: String,
    pub scripts: Vec<TemplateScript>,
}

impl RenderedView {
    pub fn new(view_id: impl Into<String>, html: String) -> Self {
        let scripts = extract_scripts(&html);
        Self {
            view_id: view_id.into(),
            html,
            scripts,
        }
    }

    /// The same view with every `<script>` element removed.
    pub fn without_scripts(&self) -> Self {
        Self {
            view_id: self.view_id.clone(),
            html: SCRIPT_RE.replace_all(&self.html, "").into_owned(),
            scripts: Vec::new(),
        }
    }

    /// Wraps the markup in a standalone HTML page.
    pub fn to_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            escape_html(title),
            self.html
        )
    }
}

pub fn extract_scripts(html: &str) -> Vec<TemplateScript> {
    SCRIPT_RE
        .captures_iter(html)
        .map(|caps| {
            let attributes = ATTR_RE
                .captures_iter(&caps[1])
                .map(|attr| {
                    let value = attr
                        .get(2)
                        .or_else(|| attr.get(3))
                        .or_else(|| attr.get(4))
                        .map_or("", |m| m.as_str());
                    (attr[1].to_string(), value.to_string())
                })
                .collect();
            let body = caps[2].trim();
            let source = (!body.is_empty()).then(|| format!("(function() {{\n{}\n}})();", body));
            TemplateScript { attributes, source }
        })
        .collect()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strips a lone `<p>...</p>` wrapper so short inline values stay inline.
pub fn unwrap_single_paragraph(rendered: &str) -> &str {
    let trimmed = rendered.trim();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") && !inner.contains("<p ") && !inner.contains("</p>") => {
            inner
        }
        _ => trimmed,
    }
}
