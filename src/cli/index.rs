use std::path::{Path, PathBuf};

use clap::Args;

use crate::build;
use crate::config::{Config, CONFIG_FILE};
use crate::index::{NoteIndex, NoteMeta, INDEX_FILE};
use crate::output;

#[derive(Args)]
pub struct IndexArgs {
    /// Markdown note file to compile and index
    pub file: PathBuf,
}

pub fn run(args: &IndexArgs) -> anyhow::Result<()> {
    let config = Config::load(Path::new(CONFIG_FILE))?;
    let source = super::read_note(&args.file)?;
    let slug = super::slug_from_target(&args.file.to_string_lossy());

    let note = build::compile_note(&source, &config)?;
    std::fs::write(format!("{slug}.html"), &note.html)?;

    let index_path = Path::new(INDEX_FILE);
    let mut index = NoteIndex::load_or_default(index_path)?;
    index.upsert(
        &slug,
        NoteMeta {
            name: note.title,
            img: note.cover,
            tags: note.tags,
        },
    );
    index.save(index_path)?;

    // Indexing does not sort; run `notedown sort` to reorder by time.
    output::success(&format!("Indexed '{slug}'"));
    Ok(())
}
