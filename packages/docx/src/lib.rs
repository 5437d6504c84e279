//! # Quill Docx
//!
//! `.docx` support for the quill editor: loads body paragraphs from
//! `word/document.xml` and writes edits back by splicing that one part,
//! leaving every other byte of the package as it was.

mod adapter;
mod atomic;
mod blank;
mod body;
mod error;
mod package;
mod splice;

pub use adapter::DocxAdapter;
pub use atomic::atomic_write;
pub use blank::create_blank;
pub use error::DocxError;
pub use package::{build_package, read_part, DOCUMENT_PART};
