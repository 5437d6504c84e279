use crate::commands::open_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct OutlineArgs {
    /// Document to outline
    pub path: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Print headings, indented by level
pub fn outline(args: OutlineArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = open_session(&args.path, &config)?;
    let headings = session.outline()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&headings)?);
        return Ok(());
    }

    if headings.is_empty() {
        println!("{}", "No headings".dimmed());
        return Ok(());
    }

    for heading in &headings {
        let indent = "  ".repeat(heading.level.saturating_sub(1) as usize);
        let text = if heading.level == 0 {
            heading.text.bold()
        } else {
            heading.text.normal()
        };
        println!("{}{}", indent, text);
    }

    Ok(())
}
