//! # Views
//!
//! A [`ViewConfig`] pairs a rule tree with a template. Views live in an ordered
//! list and the order is the priority: [`select_view`] returns the first view
//! whose rules match, and nothing after it is consulted.
//!
//! Reordering follows a single contract: [`move_view`] leaves the moved view at
//! the requested final index, whatever direction it travelled.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::document::DocumentContext;
use crate::error::{NoteViewError, Result};
use crate::host::LinkResolver;
use crate::rules::{matches, FilterGroup};

/// Template given to newly created views.
pub const DEFAULT_TEMPLATE: &str = "<div class=\"noteview\">\n  <h1>{{file.basename}}</h1>\n  {{content}}\n</div>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Stable across edits and reorders.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: FilterGroup,
    #[serde(default)]
    pub template: String,
}

impl ViewConfig {
    /// A new view with a fresh id, an empty (match-all) rule group and the
    /// default template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            rules: FilterGroup::and(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    pub fn with_rules(mut self, rules: FilterGroup) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn matches<R: LinkResolver + ?Sized>(&self, doc: &DocumentContext, links: &R) -> bool {
        matches(&self.rules, doc, links)
    }
}

/// The first view, in list order, whose rules match `doc`.
pub fn select_view<'a, R: LinkResolver + ?Sized>(
    views: &'a [ViewConfig],
    doc: &DocumentContext,
    links: &R,
) -> Option<&'a ViewConfig> {
    let selected = views.iter().find(|view| view.matches(doc, links));
    match selected {
        Some(view) => debug!(path = %doc.file.path, view = %view.name, "view selected"),
        None => debug!(path = %doc.file.path, candidates = views.len(), "no view matched"),
    }
    selected
}

/// Moves the view at `from` so that it ends up at index `to`.
///
/// `to` past the end is clamped to the last position.
pub fn move_view(views: &mut Vec<ViewConfig>, from: usize, to: usize) -> Result<()> {
    if from >= views.len() {
        return Err(NoteViewError::InvalidViewIndex {
            index: from,
            len: views.len(),
        });
    }
    let view = views.remove(from);
    let to = to.min(views.len());
    views.insert(to, view);
    Ok(())
}

/// Position of the view with `id`.
pub fn position(views: &[ViewConfig], id: &str) -> Option<usize> {
    views.iter().position(|view| view.id == id)
}
