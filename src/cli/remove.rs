use std::path::Path;

use clap::Args;

use crate::index::{NoteIndex, INDEX_FILE};
use crate::output;

#[derive(Args)]
pub struct RemoveArgs {
    /// Note id (slug) to remove; a trailing `.md` is accepted and stripped
    pub slug: String,
}

pub fn run(args: &RemoveArgs) -> anyhow::Result<()> {
    let slug = super::slug_from_target(&args.slug);

    let index_path = Path::new(INDEX_FILE);
    let mut index = NoteIndex::load(index_path)?;
    // Fails before any file is deleted when the slug is absent.
    index.remove(&slug)?;

    for filename in [format!("{slug}.md"), format!("{slug}.html")] {
        match std::fs::remove_file(&filename) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                output::warning(&format!("{filename} was already gone"));
            }
            Err(e) => return Err(e.into()),
        }
    }

    index.save(index_path)?;
    output::success(&format!("Removed '{slug}'"));
    Ok(())
}
