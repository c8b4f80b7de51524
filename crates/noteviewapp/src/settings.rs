//! # Settings
//!
//! The persisted state is one JSON document:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "workInLivePreview": false,
//!   "workInCanvas": false,
//!   "views": [ { "id": "...", "name": "Movies", "rules": {...}, "template": "..." } ]
//! }
//! ```
//!
//! ## Loading
//!
//! Loading never fails on content. The file is read as a JSON object and each
//! field is taken independently, so one malformed field falls back to its
//! default (with a warning) while the others survive. Views go one step
//! further: a malformed view is skipped and the rest of the list is kept. A
//! missing file, or a file that is not a JSON object, yields
//! [`Settings::default`].
//!
//! `views` order is the matching priority and is kept exactly as stored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{NoteViewError, Result};
use crate::views::{self, ViewConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub work_in_live_preview: bool,
    pub work_in_canvas: bool,
    pub views: Vec<ViewConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            work_in_live_preview: false,
            work_in_canvas: false,
            views: Vec::new(),
        }
    }
}

fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str, default: T) -> T {
    match object.get(key) {
        None | Some(Value::Null) => default,
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(field = key, error = %e, "malformed settings field; using default");
            default
        }),
    }
}

/// Each view is taken on its own, so one broken entry drops only itself.
fn views_field(object: &Map<String, Value>) -> Vec<ViewConfig> {
    let items = match object.get("views") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(field = "views", "malformed settings field; using default");
            return Vec::new();
        }
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match ViewConfig::deserialize(item) {
            Ok(view) => Some(view),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed view");
                None
            }
        })
        .collect()
}

impl Settings {
    /// Shallow-merges `value` over the defaults.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Settings::default();
        let Some(object) = value.as_object() else {
            warn!("settings are not a JSON object; using defaults");
            return defaults;
        };
        Self {
            enabled: field(object, "enabled", defaults.enabled),
            work_in_live_preview: field(object, "workInLivePreview", defaults.work_in_live_preview),
            work_in_canvas: field(object, "workInCanvas", defaults.work_in_canvas),
            views: views_field(object),
        }
    }

    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "unreadable settings; using defaults");
                Settings::default()
            }
        }
    }

    /// Loads settings from `path`. Only I/O errors other than "not found" are
    /// reported.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_json(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes pretty JSON to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()? + "\n")?;
        Ok(())
    }

    /// Appends `view` (lowest priority) and returns its id.
    pub fn add_view(&mut self, view: ViewConfig) -> String {
        let id = view.id.clone();
        self.views.push(view);
        id
    }

    pub fn remove_view(&mut self, id: &str) -> Result<ViewConfig> {
        let index = views::position(&self.views, id)
            .ok_or_else(|| NoteViewError::ViewNotFound(id.to_string()))?;
        Ok(self.views.remove(index))
    }

    pub fn view(&self, id: &str) -> Option<&ViewConfig> {
        self.views.iter().find(|view| view.id == id)
    }

    pub fn view_mut(&mut self, id: &str) -> Option<&mut ViewConfig> {
        self.views.iter_mut().find(|view| view.id == id)
    }

    /// See [`views::move_view`].
    pub fn move_view(&mut self, from: usize, to: usize) -> Result<()> {
        views::move_view(&mut self.views, from, to)
    }
}
