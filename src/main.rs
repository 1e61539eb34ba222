use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notedown::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Change working directory if --dir is specified
    if let Some(ref dir) = cli.dir {
        std::env::set_current_dir(dir)?;
    }

    match &cli.command {
        Command::Index(args) => notedown::cli::index::run(args)?,
        Command::Compile(args) => notedown::cli::compile::run(args)?,
        Command::Remove(args) => notedown::cli::remove::run(args)?,
        Command::Sort(args) => notedown::cli::sort::run(args)?,
    }

    Ok(())
}
