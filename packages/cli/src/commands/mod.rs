pub mod apply;
pub mod cat;
pub mod edit;
pub mod info;
pub mod new;
pub mod outline;
pub mod replace;

pub use apply::{apply, ApplyArgs};
pub use cat::{cat, CatArgs};
pub use edit::{edit, EditArgs};
pub use info::{info, InfoArgs};
pub use new::{new, NewArgs};
pub use outline::{outline, OutlineArgs};
pub use replace::{replace, ReplaceArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use quill_docx::DocxAdapter;
use quill_editor::{EditPlan, EditSession, ParagraphOp};
use std::path::Path;

/// Open `path` with the adapter configured from `config`
pub(crate) fn open_session(path: &Path, config: &Config) -> Result<EditSession<DocxAdapter>> {
    let adapter = DocxAdapter::new().with_insert_style(config.insert_style.clone());
    let mut session = EditSession::new(adapter);
    session
        .open_document(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    Ok(session)
}

/// Save to `output`, or in place
pub(crate) fn save(session: &mut EditSession<DocxAdapter>, output: Option<&Path>) -> Result<()> {
    session.save_document(output)?;
    if let Some(doc) = session.document() {
        println!("  {} Saved {}", "✓".green(), doc.path.display());
    }
    Ok(())
}

pub(crate) fn print_summary(plan: &EditPlan) {
    let summary = plan.summary();
    println!(
        "  {} updated, {} inserted, {} deleted",
        summary.updated.to_string().yellow(),
        summary.inserted.to_string().green(),
        summary.deleted.to_string().red()
    );
}

pub(crate) fn print_ops(plan: &EditPlan) {
    for op in plan {
        match op {
            ParagraphOp::Update { index, text } => {
                println!("  {} paragraph {}: {}", "~".yellow(), index + 1, text)
            }
            ParagraphOp::Insert { position, text, .. } => {
                println!("  {} paragraph {}: {}", "+".green(), position + 1, text)
            }
            ParagraphOp::Delete { index } => println!("  {} paragraph {}", "-".red(), index + 1),
        }
    }
}
