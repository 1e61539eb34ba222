use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Malformed document: {message} (byte offset {offset})")]
    MalformedDocument { message: String, offset: usize },

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Note '{slug}' not found in index")]
    NotFound { slug: String },

    #[error("Index file {path} is corrupt: {message}")]
    IndexCorrupt { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NoteError>;
