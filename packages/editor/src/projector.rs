//! # Text Projector
//!
//! Flattens a [`ParagraphStore`] into one editable buffer, one line per
//! paragraph, and records which paragraph produced each line.
//!
//! Paragraph text may itself contain line breaks, so buffer lines use a
//! small escape convention:
//!
//! | paragraph text | buffer line |
//! |----------------|-------------|
//! | `\`            | `\\`        |
//! | line feed      | `\n`        |
//! | carriage return| `\r`        |
//!
//! Everything else, tabs included, is written as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ParagraphStore;
use crate::reconcile::ReconcileError;

/// Why a buffer line could not be decoded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeFault {
    #[error("raw line break inside a line")]
    RawLineBreak,

    #[error("unknown escape sequence \\{0}")]
    UnknownEscape(char),

    #[error("backslash at end of line")]
    DanglingBackslash,
}

/// Map from buffer line to paragraph index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    lines: Vec<usize>,
}

impl Projection {
    pub fn paragraph_for_line(&self, line: usize) -> Option<usize> {
        self.lines.get(line).copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Check that this projection still describes `store`
    pub fn check(&self, store: &ParagraphStore) -> Result<(), ReconcileError> {
        let mismatch = || ReconcileError::ProjectionMismatch {
            lines: self.lines.len(),
            paragraphs: store.len(),
        };

        if self.lines.len() != store.len() {
            return Err(mismatch());
        }
        if self.lines.iter().any(|&i| i >= store.len()) {
            return Err(mismatch());
        }
        if self.lines.windows(2).any(|w| w[0] >= w[1]) {
            return Err(mismatch());
        }
        Ok(())
    }
}

/// The flat, escaped edit buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBuffer {
    lines: Vec<String>,
}

impl EditBuffer {
    /// Wrap already-escaped lines
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split editor text into lines.
    ///
    /// Lines end in `\n` or `\r\n`; the final terminator is optional, so
    /// `""` is the empty buffer and `"\n"` is one empty line.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Escape raw paragraph texts into a buffer
    pub fn from_paragraph_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: texts.into_iter().map(|t| escape_line(t.as_ref())).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Editor text, every line terminated by `\n`
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Unescape every line into paragraph text
    pub fn decode(&self) -> Result<Vec<String>, ReconcileError> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                unescape_line(line).map_err(|(column, fault)| ReconcileError::MalformedBuffer {
                    line: i + 1,
                    column,
                    fault,
                })
            })
            .collect()
    }
}

/// Project a store to its buffer and projection
pub fn project(store: &ParagraphStore) -> (EditBuffer, Projection) {
    let mut lines = Vec::with_capacity(store.len());
    let mut indices = Vec::with_capacity(store.len());

    for paragraph in store.paragraphs() {
        lines.push(escape_line(&paragraph.text));
        indices.push(paragraph.index);
    }

    (EditBuffer { lines }, Projection { lines: indices })
}

pub fn escape_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Unescape one buffer line. Errors carry the 1-based character column.
pub fn unescape_line(line: &str) -> Result<String, (usize, EscapeFault)> {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().enumerate();

    while let Some((col, c)) = chars.next() {
        match c {
            '\n' | '\r' => return Err((col + 1, EscapeFault::RawLineBreak)),
            '\\' => match chars.next() {
                Some((_, '\\')) => out.push('\\'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => return Err((col + 1, EscapeFault::UnknownEscape(other))),
                None => return Err((col + 1, EscapeFault::DanglingBackslash)),
            },
            c => out.push(c),
        }
    }

    Ok(out)
}
