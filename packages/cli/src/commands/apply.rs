use crate::commands::{open_session, print_ops, print_summary, save};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document to change
    pub path: PathBuf,

    /// Edited text (reads stdin when omitted or "-")
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the result here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show the changes without saving
    #[arg(long)]
    pub dry_run: bool,
}

/// Apply an edited buffer produced by `quill cat`
pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let text = match &args.input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut session = open_session(&args.path, &config)?;

    if args.dry_run {
        let plan = session.preview_edits(&text)?;
        println!("{} {}", "Preview".bright_blue().bold(), args.path.display());
        print_ops(&plan);
        print_summary(&plan);
        return Ok(());
    }

    let plan = session.apply_edits(&text)?;
    if plan.is_empty() && args.output.is_none() {
        println!("  No changes");
        return Ok(());
    }

    print_summary(&plan);
    save(&mut session, args.output.as_deref())
}
