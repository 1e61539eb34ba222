use std::path::Path;

use clap::Args;

use crate::index::{NoteIndex, INDEX_FILE};
use crate::output;

#[derive(Args)]
pub struct SortArgs {}

pub fn run(_args: &SortArgs) -> anyhow::Result<()> {
    let index_path = Path::new(INDEX_FILE);
    let mut index = NoteIndex::load(index_path)?;
    index.sort_by_time_desc();
    index.save(index_path)?;

    output::success(&format!("Sorted {} notes by time", index.len()));
    Ok(())
}
