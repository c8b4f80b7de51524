//! # API Facade
//!
//! [`NoteViewApi`] is the single entry point for UI clients. It owns the vault,
//! the settings and a markdown renderer, and strings the core together:
//!
//! ```text
//! path ──load──▶ DocumentContext ──select_view──▶ ViewConfig ──render_view──▶ RenderedView
//! ```
//!
//! The facade does no terminal I/O and holds no presentation logic. When the
//! settings are disabled, matching and rendering report "no view" rather than
//! failing, so a client can fall back to its normal display.
//!
//! ## Generic Over the Renderer
//!
//! `NoteViewApi<R: MarkdownRenderer>`:
//! - Production: `NoteViewApi<PulldownRenderer>`
//! - Testing: any renderer, including one that records its calls

use std::path::Path;

use crate::document::DocumentContext;
use crate::error::Result;
use crate::host::MarkdownRenderer;
use crate::properties::{scan_properties, PropertyDef};
use crate::settings::Settings;
use crate::template::{render_view, RenderedView};
use crate::vault::FsVault;
use crate::views::{select_view, ViewConfig};

pub struct NoteViewApi<R: MarkdownRenderer> {
    vault: FsVault,
    settings: Settings,
    renderer: R,
}

impl<R: MarkdownRenderer> NoteViewApi<R> {
    pub fn new(vault: FsVault, settings: Settings, renderer: R) -> Self {
        Self {
            vault,
            settings,
            renderer,
        }
    }

    pub fn vault(&self) -> &FsVault {
        &self.vault
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn save_settings(&self, path: &Path) -> Result<()> {
        self.settings.save(path)
    }

    pub fn load_document(&self, path: &str) -> Result<DocumentContext> {
        self.vault.load(path)
    }

    /// The view that would display `path`, if any.
    pub fn match_document(&self, path: &str) -> Result<Option<&ViewConfig>> {
        if !self.settings.enabled {
            return Ok(None);
        }
        let doc = self.vault.load(path)?;
        Ok(select_view(&self.settings.views, &doc, &self.vault))
    }

    /// Renders `path` with its matching view.
    pub async fn render_document(&self, path: &str) -> Result<Option<RenderedView>> {
        if !self.settings.enabled {
            return Ok(None);
        }
        let doc = self.vault.load(path)?;
        let Some(view) = select_view(&self.settings.views, &doc, &self.vault) else {
            return Ok(None);
        };
        Ok(Some(
            render_view(&view.id, &view.template, &doc, &self.renderer).await,
        ))
    }

    /// Properties found across the whole vault, for rule editors.
    pub fn properties(&self) -> Vec<PropertyDef> {
        scan_properties(&self.vault.documents())
    }
}
