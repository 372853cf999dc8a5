//! CourseDocs CLI — batch course-document generator.
//!
//! Fills a .docx template once per course row, matching each row to its
//! group link, and packages the results as a zip archive.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
