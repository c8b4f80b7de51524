use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteViewError {
    #[error("Document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Invalid view index {index} (have {len} views)")]
    InvalidViewIndex { index: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Vault error: {0}")]
    Vault(String),
}

pub type Result<T> = std::result::Result<T, NoteViewError>;
