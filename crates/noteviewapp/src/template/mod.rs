//! # Template Rendering
//!
//! A view template is HTML with `{{ ... }}` placeholders:
//!
//! ```text
//! <img class="cover" src="{{cover}}">
//! <h1>{{file.basename}}</h1>
//! <p>Released {{ release | date:"MMMM YYYY" }}, starring {{ cast[0] }}</p>
//! {{content}}
//! ```
//!
//! ## Placeholder Grammar
//!
//! `FIELD [INDEX] [| CHAIN]`
//!
//! - `file.*` names the document builtins (`name`, `basename`, `path`, `folder`,
//!   `extension`, `size`, `ctime`, `mtime`, `tags`, `aliases`). Any other field
//!   is a frontmatter key, used verbatim (spaces allowed).
//! - `[INDEX]` picks one element of a list value. Out of range is empty.
//! - `CHAIN` runs through [`crate::filters::apply_filter_chain`].
//! - An unknown field renders as an empty string; its chain is not run.
//! - `content` (or `file.content`) is reserved for the document body.
//!
//! ## Context
//!
//! Quote parity over the template text before a placeholder decides its
//! context (see [`scanner`]):
//!
//! - **Attribute**: an unmatched `"` or `'` precedes it. The value is
//!   substituted raw, with no markdown pass.
//! - **Body**: everything else. The value goes through the host's
//!   [`MarkdownRenderer`] and is mounted in a `<span>`. A result that is a single
//!   `<p>` is unwrapped so inline values stay inline.
//!
//! Renderer calls are awaited one at a time: body placeholders in template
//! order, then the document body once. A renderer failure is logged and that
//! slot falls back to escaped text.

mod output;
mod resolve;
mod scanner;

use tracing::warn;

use crate::document::DocumentContext;
use crate::host::MarkdownRenderer;

pub use output::{escape_html, extract_scripts, unwrap_single_paragraph, RenderedView, TemplateScript};
pub use resolve::{evaluate, resolve_value, Placeholder};
pub use scanner::{scan, Segment};

/// Wrapper class for the rendered document body.
pub const CONTENT_CLASS: &str = "noteview-content";
/// Inner wrapper around the rendered body, matching the host's reading view.
pub const SIZER_CLASS: &str = "markdown-preview-sizer";

enum Part {
    Markup(String),
    /// Index into the queue of body-context values.
    Slot(usize),
    Content,
}

/// Substitutes every placeholder of `template` for `doc`.
pub async fn render_template<R: MarkdownRenderer>(
    template: &str,
    doc: &DocumentContext,
    renderer: &R,
) -> String {
    let mut parts = Vec::new();
    let mut queued: Vec<String> = Vec::new();

    for segment in scan(template) {
        match segment {
            Segment::Text(text) => parts.push(Part::Markup(text.to_string())),
            Segment::Placeholder { expr, in_attribute } => match Placeholder::parse(expr) {
                Placeholder::Content => parts.push(Part::Content),
                Placeholder::Field { key, index, chain } => {
                    let value = evaluate(doc, key, index, chain);
                    if in_attribute {
                        parts.push(Part::Markup(value));
                    } else {
                        parts.push(Part::Slot(queued.len()));
                        queued.push(value);
                    }
                }
            },
        }
    }

    let mut rendered_slots = Vec::with_capacity(queued.len());
    for value in &queued {
        let inner = if value.is_empty() {
            String::new()
        } else {
            match renderer.render_markdown(value, &doc.file.path).await {
                Ok(html) => unwrap_single_paragraph(&html).to_string(),
                Err(error) => {
                    warn!(path = %doc.file.path, %error, "markdown render failed; using raw text");
                    escape_html(value)
                }
            }
        };
        rendered_slots.push(format!("<span>{}</span>", inner));
    }

    let content = if parts.iter().any(|p| matches!(p, Part::Content)) {
        let body = doc.body.trim();
        let inner = match renderer.render_markdown(body, &doc.file.path).await {
            Ok(html) => html,
            Err(error) => {
                warn!(path = %doc.file.path, %error, "markdown render failed for body; using raw text");
                format!("<pre>{}</pre>", escape_html(body))
            }
        };
        format!(
            "<div class=\"{}\"><div class=\"{}\">{}</div></div>",
            CONTENT_CLASS, SIZER_CLASS, inner
        )
    } else {
        String::new()
    };

    let mut html = String::new();
    for part in parts {
        match part {
            Part::Markup(text) => html.push_str(&text),
            Part::Slot(idx) => html.push_str(&rendered_slots[idx]),
            Part::Content => html.push_str(&content),
        }
    }
    html
}

/// Renders `template` and packages the markup with its scripts.
pub async fn render_view<R: MarkdownRenderer>(
    view_id: &str,
    template: &str,
    doc: &DocumentContext,
    renderer: &R,
) -> RenderedView {
    let html = render_template(template, doc, renderer).await;
    RenderedView::new(view_id, html)
}
