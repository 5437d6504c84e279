use crate::commands::open_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Document to describe
    pub path: PathBuf,

    /// List every paragraph with its style
    #[arg(short, long)]
    pub structure: bool,

    /// Characters of text shown per paragraph
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Document statistics and, optionally, the paragraph structure
pub fn info(args: InfoArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = open_session(&args.path, &config)?;

    let stats = session.stats()?;
    let width = args.width.unwrap_or(config.preview_width);
    let structure = if args.structure {
        session.structure(width)?
    } else {
        Vec::new()
    };

    if args.format == "json" {
        let mut value = json!({ "path": args.path, "stats": stats });
        if args.structure {
            value["structure"] = serde_json::to_value(&structure)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("📄 {}", args.path.display().to_string().bright_white().bold());
    println!("   Paragraphs: {}", stats.paragraphs);
    println!("   Words:      {}", stats.words);
    println!("   Characters: {}", stats.characters);

    if !structure.is_empty() {
        println!();
        for entry in &structure {
            println!(
                "   Paragraph {} [{}]: {}",
                entry.index + 1,
                entry.style.cyan(),
                entry.preview
            );
        }
    }

    Ok(())
}
