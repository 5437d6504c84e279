//! Error types for the docx adapter

use std::io;
use std::path::Path;

use quill_editor::ContainerError;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid zip package: {0}")]
    Zip(#[from] ZipError),

    #[error("Invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Package has no {0} part")]
    MissingPart(String),

    #[error("Part {0} is not UTF-8")]
    NotUtf8(String),

    #[error("Not a WordprocessingML document (no w:body)")]
    NoBody,

    #[error("Unterminated tag at byte {0}")]
    UnterminatedTag(usize),

    #[error("word/document.xml changed since load")]
    Changed,

    #[error("Container was not loaded by this adapter")]
    NotLoaded,

    #[error("Style reference {0} does not belong to this document")]
    ForeignStyle(String),

    #[error("Paragraph slots out of document order at slot {0}")]
    SlotOrder(usize),
}

impl DocxError {
    /// Map a failure while reading `path`
    pub fn on_load(self, path: &Path) -> ContainerError {
        match self {
            DocxError::Io(e) if e.kind() == io::ErrorKind::NotFound => ContainerError::NotFound {
                path: path.to_path_buf(),
            },
            other => ContainerError::format(path, other.to_string()),
        }
    }

    /// Map a failure while producing `path`
    pub fn on_write(self, path: &Path) -> ContainerError {
        match self {
            DocxError::Io(e) | DocxError::Zip(ZipError::Io(e)) => ContainerError::write(path, e),
            other => ContainerError::format(path, other.to_string()),
        }
    }
}
