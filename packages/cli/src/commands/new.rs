use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_docx::create_blank;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Path of the document to create
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

pub fn new(args: NewArgs, _cwd: &str) -> Result<()> {
    if args.path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            args.path.display().to_string().bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    create_blank(&args.path)?;
    println!("  {} Created {}", "✓".green(), args.path.display());
    Ok(())
}
