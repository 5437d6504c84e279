use crate::commands::{open_session, print_summary, save};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use quill_editor::{EditorError, ReconcileError};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document to edit
    pub path: PathBuf,

    /// Write the result here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Editor command (overrides config, $VISUAL and $EDITOR)
    #[arg(short, long)]
    pub editor: Option<String>,
}

/// Edit the document text in an external editor
pub fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let editor = args.editor.clone().unwrap_or_else(|| config.editor_command());
    let mut session = open_session(&args.path, &config)?;

    let mut scratch = tempfile::Builder::new()
        .prefix("quill-")
        .suffix(".txt")
        .tempfile()?;
    scratch.write_all(session.get_editable_text()?.as_bytes())?;
    scratch.flush()?;

    let plan = loop {
        run_editor(&editor, scratch.path())?;
        let text = fs::read_to_string(scratch.path())?;

        match session.apply_edits(&text) {
            Ok(plan) => break plan,
            Err(EditorError::Reconcile(err @ ReconcileError::MalformedBuffer { .. })) => {
                eprintln!("{} {}", "Error:".red().bold(), err);
                if !confirm("Edit again?")? {
                    bail!("Edit abandoned; {} was not changed", args.path.display());
                }
            }
            Err(err) => return Err(err.into()),
        }
    };

    if plan.is_empty() && args.output.is_none() {
        println!("  No changes");
        return Ok(());
    }

    print_summary(&plan);
    save(&mut session, args.output.as_deref())
}

fn run_editor(command: &str, file: &Path) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts.next().context("Empty editor command")?;
    debug!(editor = command, file = %file.display(), "Launching editor");

    let status = Command::new(program)
        .args(parts)
        .arg(file)
        .status()
        .with_context(|| format!("Cannot run editor '{}'", command))?;

    if !status.success() {
        bail!("Editor '{}' exited with {}", command, status);
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{} [Y/n] ", question);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("\n"));
        assert!(is_yes("Y\n"));
        assert!(is_yes(" yes "));
        assert!(!is_yes("n\n"));
        assert!(!is_yes("nope"));
    }
}
