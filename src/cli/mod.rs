pub mod compile;
pub mod index;
pub mod remove;
pub mod sort;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::error::{NoteError, Result};

#[derive(Parser)]
#[command(
    name = "notedown",
    about = "Compile Markdown notes to HTML fragments and maintain a note index",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working directory holding notes, index.json, and notedown.toml
    #[arg(short, long, global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a note to HTML and record it in the index
    Index(index::IndexArgs),

    /// Compile a note to HTML without touching the index
    Compile(compile::CompileArgs),

    /// Remove a note's files and its index record
    Remove(remove::RemoveArgs),

    /// Rewrite the index sorted by time, newest first
    Sort(sort::SortArgs),
}

/// Derive a note's slug from its filename, dropping directories and the
/// extension: `notes/note-1.md` → `note-1`.
pub(crate) fn slug_from_target(target: &str) -> String {
    Path::new(target)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.to_string())
}

/// Read a note file, mapping a missing file to an explicit error.
pub(crate) fn read_note(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NoteError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            NoteError::Io(e)
        }
    })
}
