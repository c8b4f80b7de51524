//! A [`MarkdownRenderer`] backed by `pulldown-cmark`.
//!
//! Wikilinks are not CommonMark, so they are rewritten to inline HTML first:
//!
//! - `[[Note|shown]]` → `<a class="internal-link" href="Note">shown</a>`
//! - `![[cover.jpg]]` → `<img class="internal-embed" src="cover.jpg" alt="cover.jpg">`
//!
//! Fenced code blocks are left untouched.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

use crate::error::Result;
use crate::host::MarkdownRenderer;
use crate::template::escape_html;

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[\[([^\[\]]+?)\]\]").expect("wikilink pattern is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct PulldownRenderer;

impl PulldownRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, markdown: &str) -> String {
        let source = rewrite_wikilinks(markdown);
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        let parser = Parser::new_ext(&source, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }
}

impl MarkdownRenderer for PulldownRenderer {
    async fn render_markdown(&self, markdown: &str, _source_path: &str) -> Result<String> {
        Ok(self.render(markdown))
    }
}

fn wikilink_html(caps: &Captures) -> String {
    let inner = &caps[2];
    let (target, label) = match inner.split_once('|') {
        Some((target, label)) => (target.trim(), label.trim()),
        None => (inner.trim(), inner.trim()),
    };
    let href = escape_html(&target.replace(' ', "%20"));
    if &caps[1] == "!" {
        format!(
            "<img class=\"internal-embed\" src=\"{}\" alt=\"{}\">",
            href,
            escape_html(label)
        )
    } else {
        format!(
            "<a class=\"internal-link\" href=\"{}\">{}</a>",
            href,
            escape_html(label)
        )
    }
}

/// Rewrites wikilinks outside fenced code blocks.
pub fn rewrite_wikilinks(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut fence: Option<&str> = None;
    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) => {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
                out.push_str(line);
            }
            None if trimmed.starts_with("```") || trimmed.starts_with("~~~") => {
                fence = Some(&trimmed[..3]);
                out.push_str(line);
            }
            None => out.push_str(&WIKILINK_RE.replace_all(line, wikilink_html)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_commonmark_with_extensions() {
        let html = PulldownRenderer.render("# Title\n\n~~old~~ *new*\n\n| a |\n|---|\n| 1 |\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<em>new</em>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_task_lists() {
        let html = PulldownRenderer.render("- [x] done\n");
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_wikilinks_become_anchors() {
        assert_eq!(
            PulldownRenderer.render("See [[Michael Mann|Mann]]"),
            "<p>See <a class=\"internal-link\" href=\"Michael%20Mann\">Mann</a></p>\n"
        );
    }

    #[test]
    fn test_embeds_become_images() {
        assert_eq!(
            rewrite_wikilinks("![[heat.jpg]]"),
            "<img class=\"internal-embed\" src=\"heat.jpg\" alt=\"heat.jpg\">"
        );
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let src = "```\n[[not a link]]\n```\n[[Link]]\n";
        let out = rewrite_wikilinks(src);
        assert!(out.contains("[[not a link]]"));
        assert!(out.contains("<a class=\"internal-link\" href=\"Link\">Link</a>"));
    }

    #[tokio::test]
    async fn test_async_renderer() {
        let html = PulldownRenderer.render_markdown("**x**", "a.md").await.unwrap();
        assert_eq!(html, "<p><strong>x</strong></p>\n");
    }
}
