mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, cat, edit, info, new, outline, replace, ApplyArgs, CatArgs, EditArgs, InfoArgs,
    NewArgs, OutlineArgs, ReplaceArgs,
};
use tracing_subscriber::EnvFilter;

/// Quill - edit .docx text as plain lines without losing formatting
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a blank document
    New(NewArgs),

    /// Print the editable text of a document
    Cat(CatArgs),

    /// Apply edited text to a document
    Apply(ApplyArgs),

    /// Edit a document in your text editor
    Edit(EditArgs),

    /// Show statistics and paragraph structure
    Info(InfoArgs),

    /// List headings
    Outline(OutlineArgs),

    /// Find and replace text
    Replace(ReplaceArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::New(args) => new(args, &cwd),
        Command::Cat(args) => cat(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Edit(args) => edit(args, &cwd),
        Command::Info(args) => info(args, &cwd),
        Command::Outline(args) => outline(args, &cwd),
        Command::Replace(args) => replace(args, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replace_flags() {
        let cli = Cli::parse_from([
            "quill", "replace", "doc.docx", "colour", "color", "--whole-word", "-o", "out.docx",
        ]);
        match cli.command {
            Command::Replace(args) => {
                assert!(args.whole_word);
                assert!(!args.regex);
                assert_eq!(args.output.unwrap().to_str(), Some("out.docx"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
