use crate::commands::open_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CatArgs {
    /// Document to print
    pub path: PathBuf,
}

/// Print the editable text, one paragraph per line
pub fn cat(args: CatArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = open_session(&args.path, &config)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(session.get_editable_text()?.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
