use std::path::{Path, PathBuf};

use clap::Args;

use crate::build;
use crate::config::{Config, CONFIG_FILE};
use crate::output;

#[derive(Args)]
pub struct CompileArgs {
    /// Markdown note file to compile
    pub file: PathBuf,
}

pub fn run(args: &CompileArgs) -> anyhow::Result<()> {
    let config = Config::load(Path::new(CONFIG_FILE))?;
    let source = super::read_note(&args.file)?;
    let slug = super::slug_from_target(&args.file.to_string_lossy());

    let note = build::compile_note(&source, &config)?;
    std::fs::write(format!("{slug}.html"), &note.html)?;

    output::success(&format!("Compiled '{slug}' to {slug}.html"));
    Ok(())
}
