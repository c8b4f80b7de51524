//! # Filesystem Vault
//!
//! [`FsVault`] is the host side for notes stored as plain markdown files under
//! one root directory. It builds [`DocumentContext`]s from files on disk and
//! resolves wikilinks the way note apps do.
//!
//! ## Link Resolution
//!
//! `[[target#heading|alias]]` is reduced to `target`, then tried as:
//!
//! 1. a vault-relative path, as written and with `.md` appended
//! 2. a path relative to the linking note's folder (`..` allowed)
//! 3. any note whose file name or path suffix matches, shortest path first
//!
//! Hidden directories (`.git`, `.obsidian`, `.noteview`) are never indexed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{DocumentContext, FileInfo};
use crate::error::{NoteViewError, Result};
use crate::host::{link_path, LinkResolver};

const NOTE_EXT: &str = "md";

pub struct FsVault {
    root: PathBuf,
    /// Vault-relative note paths, `/` separated, sorted.
    notes: Vec<String>,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn millis(time: std::io::Result<SystemTime>) -> Option<i64> {
    let time = time.ok()?;
    let since = time.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(since.as_millis()).ok()
}

/// Collapses `.` and `..` segments. `None` if the path escapes the root.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

impl FsVault {
    /// Indexes every markdown note under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(NoteViewError::Vault(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        let mut notes = Vec::new();
        for entry in WalkDir::new(&root).into_iter().filter_entry(|e| !is_hidden(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable vault entry");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str()) != Some(NOTE_EXT)
            {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&root) {
                notes.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        notes.sort();
        debug!(root = %root.display(), notes = notes.len(), "vault indexed");
        Ok(Self { root, notes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn contains(&self, path: &str) -> bool {
        self.notes.binary_search_by(|n| n.as_str().cmp(path)).is_ok()
    }

    /// Turns a user-supplied path (absolute, cwd-relative or vault-relative)
    /// into a vault-relative one.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let as_text = path.to_string_lossy().replace('\\', "/");
        if self.contains(as_text.trim_start_matches("./")) {
            return Some(as_text.trim_start_matches("./").to_string());
        }
        let absolute = fs::canonicalize(path).ok()?;
        let root = fs::canonicalize(&self.root).ok()?;
        let rel = absolute.strip_prefix(root).ok()?;
        Some(rel.to_string_lossy().replace('\\', "/"))
    }

    /// Reads and parses the note at the vault-relative `path`.
    pub fn load(&self, path: &str) -> Result<DocumentContext> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(NoteViewError::DocumentNotFound(full));
        }
        let raw = fs::read_to_string(&full)?;
        let meta = fs::metadata(&full)?;
        let mtime = millis(meta.modified()).unwrap_or(0);
        let ctime = millis(meta.created()).unwrap_or(mtime);
        let file = FileInfo::from_path(path)
            .with_size(meta.len())
            .with_times(ctime, mtime);
        Ok(DocumentContext::parse(file, &raw))
    }

    /// Every note that could be read. Unreadable notes are logged and skipped.
    pub fn documents(&self) -> Vec<DocumentContext> {
        self.notes
            .iter()
            .filter_map(|path| match self.load(path) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping unreadable note");
                    None
                }
            })
            .collect()
    }

    fn lookup_exact(&self, candidate: &str) -> Option<String> {
        let with_ext = format!("{}.{}", candidate, NOTE_EXT);
        let found = [candidate, with_ext.as_str()]
            .into_iter()
            .find(|c| self.contains(c))
            .map(str::to_string);
        found
    }
}

impl LinkResolver for FsVault {
    fn resolve_link(&self, link: &str, from_path: &str) -> Option<String> {
        let target = link_path(link).trim_start_matches('/');
        if target.is_empty() {
            return None;
        }

        if let Some(found) = normalize(target).and_then(|t| self.lookup_exact(&t)) {
            return Some(found);
        }

        let folder = FileInfo::from_path(from_path).folder;
        if !folder.is_empty() {
            if let Some(found) =
                normalize(&format!("{}/{}", folder, target)).and_then(|t| self.lookup_exact(&t))
            {
                return Some(found);
            }
        }

        let suffix = format!("/{}", target);
        let suffix_md = format!("/{}.{}", target, NOTE_EXT);
        self.notes
            .iter()
            .filter(|note| {
                let rooted = format!("/{}", note);
                rooted.ends_with(&suffix) || rooted.ends_with(&suffix_md)
            })
            .min_by_key(|note| (note.len(), note.as_str()))
            .cloned()
    }
}
