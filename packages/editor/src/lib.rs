//! # Quill Editor
//!
//! Edit the text of a packaged document as one flat buffer and write the
//! changes back without disturbing anything else in the container.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ container adapter: file → (text, style)*    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: ParagraphStore                       │
//! │  - dense paragraph indices                  │
//! │  - opaque style handles                     │
//! └─────────────────────────────────────────────┘
//!                     ↓ project
//! ┌─────────────────────────────────────────────┐
//! │ projector: EditBuffer + Projection          │
//! └─────────────────────────────────────────────┘
//!                     ↓ user edits, reconcile
//! ┌─────────────────────────────────────────────┐
//! │ reconcile: EditPlan (update/insert/delete)  │
//! └─────────────────────────────────────────────┘
//!                     ↓ apply, serialize
//! ┌─────────────────────────────────────────────┐
//! │ container adapter: ContainerPatch → file    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Store is source of truth**: buffer and projection are derived views
//! 2. **Touch only what changed**: untouched paragraphs reach the container
//!    as `Keep`, so the adapter can copy them byte for byte
//! 3. **All or nothing**: reconcile, apply, load and save either succeed or
//!    leave the previous state in place
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_editor::EditSession;
//! use quill_docx::DocxAdapter;
//!
//! let mut session = EditSession::new(DocxAdapter::new());
//! session.open_document("letter.docx")?;
//!
//! let text = session.get_editable_text()?;
//! let edited = text.replace("Dear Sir", "Dear Madam");
//! session.apply_edits(&edited)?;
//!
//! session.save_document(None)?;
//! ```

mod container;
mod document;
mod errors;
mod model;
mod ops;
mod projector;
mod reconcile;
mod search;
mod session;
mod stats;
mod undo_stack;

pub use container::{
    ContainerAdapter, ContainerError, ContainerPatch, MemoryContainer, MemoryFile, MemoryParagraph,
    PatchEntry, SourceParagraph,
};
pub use document::Document;
pub use errors::EditorError;
pub use model::{Paragraph, ParagraphStore, StoreState, StyleRef};
pub use ops::{EditPlan, OperationError, ParagraphOp, PlanSummary};
pub use projector::{escape_line, project, unescape_line, EditBuffer, EscapeFault, Projection};
pub use reconcile::{reconcile, ReconcileError};
pub use search::{SearchMatch, SearchQuery};
pub use session::{EditSession, DEFAULT_PREVIEW_WIDTH};
pub use stats::{heading_level, DocumentStats, OutlineEntry, StructureEntry, DEFAULT_STYLE_LABEL};
pub use undo_stack::{Snapshot, UndoStack};
