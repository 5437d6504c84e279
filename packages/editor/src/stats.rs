//! Document statistics, structure listing and headings outline

use serde::{Deserialize, Serialize};

use crate::model::{ParagraphStore, StyleRef};

/// Style name shown for paragraphs without a known style
pub const DEFAULT_STYLE_LABEL: &str = "Normal";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub paragraphs: usize,
    pub words: usize,
    pub characters: usize,

    /// Paragraphs with changed text awaiting save
    pub modified: usize,

    /// Paragraphs inserted since load
    pub inserted: usize,

    /// Source paragraphs deleted since load
    pub removed: usize,
}

impl DocumentStats {
    pub fn collect(store: &ParagraphStore) -> Self {
        let mut stats = Self {
            paragraphs: store.len(),
            removed: store.removed().len(),
            ..Self::default()
        };

        for p in store.paragraphs() {
            stats.words += p.text.split_whitespace().count();
            stats.characters += p.text.chars().count();
            if p.is_inserted() {
                stats.inserted += 1;
            } else if p.dirty {
                stats.modified += 1;
            }
        }

        stats
    }
}

/// One line of the structure listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureEntry {
    pub index: usize,
    pub style: String,
    pub preview: String,
    pub dirty: bool,
}

/// Paragraph list with style names and truncated text
pub fn structure<F>(store: &ParagraphStore, preview_width: usize, label: F) -> Vec<StructureEntry>
where
    F: Fn(&StyleRef) -> Option<String>,
{
    store
        .paragraphs()
        .iter()
        .map(|p| StructureEntry {
            index: p.index,
            style: p
                .style
                .as_ref()
                .and_then(&label)
                .unwrap_or_else(|| DEFAULT_STYLE_LABEL.to_string()),
            preview: preview(&p.text, preview_width),
            dirty: p.dirty,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub index: usize,

    /// 0 for a title, 1.. for headings
    pub level: u8,
    pub text: String,
}

/// Headings, judged by style name
pub fn outline<F>(store: &ParagraphStore, label: F) -> Vec<OutlineEntry>
where
    F: Fn(&StyleRef) -> Option<String>,
{
    store
        .paragraphs()
        .iter()
        .filter_map(|p| {
            let name = p.style.as_ref().and_then(&label)?;
            let level = heading_level(&name)?;
            Some(OutlineEntry {
                index: p.index,
                level,
                text: p.text.clone(),
            })
        })
        .collect()
}

/// `Title` → 0, `Heading 2` / `Heading2` / `heading 2` → 2
pub fn heading_level(style_name: &str) -> Option<u8> {
    let name = style_name.trim();
    if name.eq_ignore_ascii_case("title") {
        return Some(0);
    }

    let lower = name.to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?.trim_start();
    match rest.parse::<u8>() {
        Ok(level) if (1..=9).contains(&level) => Some(level),
        _ => None,
    }
}

fn preview(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if flat.chars().count() > width {
        let mut cut: String = flat.chars().take(width).collect();
        cut.push_str("...");
        cut
    } else {
        flat
    }
}
