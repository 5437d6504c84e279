use crate::commands::{open_session, print_ops, save};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::SearchQuery;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    /// Document to change
    pub path: PathBuf,

    /// Text (or regular expression with --regex) to find
    pub pattern: String,

    /// Replacement text; `$1` refers to capture groups with --regex
    pub replacement: String,

    /// Match case exactly
    #[arg(short, long)]
    pub case_sensitive: bool,

    /// Only match whole words
    #[arg(short, long)]
    pub whole_word: bool,

    /// Treat the pattern as a regular expression
    #[arg(short, long)]
    pub regex: bool,

    /// Write the result here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show the changes without saving
    #[arg(long)]
    pub dry_run: bool,
}

/// Find and replace across all paragraphs
pub fn replace(args: ReplaceArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut session = open_session(&args.path, &config)?;

    let query = SearchQuery::literal(args.pattern.as_str())
        .case_sensitive(args.case_sensitive)
        .whole_word(args.whole_word)
        .regex(args.regex);

    let count = session.replace_all(&query, &args.replacement)?;
    if count == 0 {
        println!("  No matches for '{}'", args.pattern);
        return Ok(());
    }

    println!(
        "  {} {} replacement{}",
        "✓".green(),
        count,
        if count == 1 { "" } else { "s" }
    );

    if args.dry_run {
        let original = open_session(&args.path, &config)?;
        let plan = original.preview_edits(&session.get_editable_text()?)?;
        print_ops(&plan);
        return Ok(());
    }

    save(&mut session, args.output.as_deref())
}
