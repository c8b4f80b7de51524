//! # Host Capabilities
//!
//! The core borrows two capabilities from whatever application embeds it:
//!
//! - [`LinkResolver`]: turns raw link text into a vault path, relative to the
//!   document that contains the link. Used by the `links to` operator.
//! - [`MarkdownRenderer`]: turns markdown into display markup. Used by the
//!   template renderer for body-context placeholders and the document body.
//!
//! [`crate::vault::FsVault`] and [`crate::markdown::PulldownRenderer`] are the
//! filesystem implementations shipped with the library. Closures also work as
//! link resolvers, which keeps tests free of any vault setup.

use crate::error::Result;

pub trait LinkResolver {
    /// Resolves `link` (as written, possibly with `#heading` or `|alias`) to a
    /// vault path, relative to the document at `from_path`.
    fn resolve_link(&self, link: &str, from_path: &str) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn resolve_link(&self, link: &str, from_path: &str) -> Option<String> {
        self(link, from_path)
    }
}

/// A resolver that never resolves; links compare by their normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkResolver for NoLinks {
    fn resolve_link(&self, _link: &str, _from_path: &str) -> Option<String> {
        None
    }
}

/// Renders markdown for display.
///
/// Calls are awaited one at a time, in placeholder order, so implementations
/// need not be reentrant. Rendering the same input twice must be safe.
#[allow(async_fn_in_trait)]
pub trait MarkdownRenderer {
    async fn render_markdown(&self, markdown: &str, source_path: &str) -> Result<String>;
}

/// Strips `|alias` and `#heading` suffixes from link text.
pub fn link_path(link: &str) -> &str {
    let link = link.split('|').next().unwrap_or(link);
    link.split('#').next().unwrap_or(link).trim()
}
