//! # Edit Session
//!
//! The surface an editor (GUI, CLI, tests) talks to. A session owns the
//! container adapter, at most one open [`Document`], and its undo history.
//! There is no global "current document": everything hangs off the session
//! value the caller holds.

use std::path::Path;

use tracing::{info, warn};

use crate::container::ContainerAdapter;
use crate::document::Document;
use crate::ops::{EditPlan, ParagraphOp};
use crate::projector::EditBuffer;
use crate::search::{self, SearchQuery};
use crate::stats::{self, DocumentStats, OutlineEntry, StructureEntry};
use crate::undo_stack::{Snapshot, UndoStack};
use crate::EditorError;

/// Characters of paragraph text shown in a structure listing
pub const DEFAULT_PREVIEW_WIDTH: usize = 30;

/// Single-user edit session
pub struct EditSession<A: ContainerAdapter> {
    adapter: A,
    document: Option<Document>,
    history: UndoStack,
}

impl<A: ContainerAdapter> EditSession<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            document: None,
            history: UndoStack::new(),
        }
    }

    pub fn with_history(adapter: A, history: UndoStack) -> Self {
        Self {
            adapter,
            document: None,
            history,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    fn current(&self) -> Result<&Document, EditorError> {
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    /// Open a container, replacing any open document.
    ///
    /// On failure the previously open document stays open.
    pub fn open_document(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        let document = Document::open(&mut self.adapter, path.as_ref())?;
        if let Some(previous) = &self.document {
            if previous.is_dirty() {
                warn!(path = %previous.path.display(), "Discarding unsaved changes");
            }
        }
        self.document = Some(document);
        self.history.clear();
        Ok(())
    }

    /// The buffer text for the open document
    pub fn get_editable_text(&self) -> Result<String, EditorError> {
        Ok(self.current()?.editable_text())
    }

    /// Reconcile edited text without applying it
    pub fn preview_edits(&self, text: &str) -> Result<EditPlan, EditorError> {
        self.current()?.plan(&EditBuffer::from_text(text))
    }

    /// Reconcile edited text into the open document.
    ///
    /// On error nothing changes: not the store, not the projection, not the
    /// history.
    pub fn apply_edits(&mut self, text: &str) -> Result<EditPlan, EditorError> {
        self.apply_buffer(&EditBuffer::from_text(text), None)
    }

    fn apply_buffer(
        &mut self,
        buffer: &EditBuffer,
        description: Option<String>,
    ) -> Result<EditPlan, EditorError> {
        let plan = self.current()?.plan(buffer)?;
        self.commit(&plan, description)?;
        Ok(plan)
    }

    /// Apply `plan` and record the pre-edit store for undo
    fn commit(&mut self, plan: &EditPlan, description: Option<String>) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        if plan.is_empty() {
            return Ok(());
        }

        let before = document.store().clone();
        document.apply_plan(plan)?;

        let mut snapshot = Snapshot::new(before);
        snapshot.description = description;
        self.history.record(snapshot);
        Ok(())
    }

    /// Save to `path`, or back to where the document was opened from
    pub fn save_document(&mut self, path: Option<&Path>) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        document.save(&mut self.adapter, path)?;
        self.history.clear();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        if self.history.undo(document) {
            Ok(())
        } else {
            Err(EditorError::NothingToUndo)
        }
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        if self.history.redo(document) {
            Ok(())
        } else {
            Err(EditorError::NothingToRedo)
        }
    }

    /// Replace every match of `query`; returns the number of replacements.
    ///
    /// Each changed paragraph is updated in place, so it keeps its style even
    /// when its new text matches a neighbour's.
    pub fn replace_all(
        &mut self,
        query: &SearchQuery,
        replacement: &str,
    ) -> Result<usize, EditorError> {
        let pattern = query.compile()?;
        let store = self.current()?.store();
        let (texts, count) = search::replace_all(store, &pattern, replacement, query.regex);

        let ops = store
            .paragraphs()
            .iter()
            .zip(texts)
            .filter(|(p, text)| p.text != *text)
            .map(|(p, text)| ParagraphOp::Update {
                index: p.index,
                text,
            })
            .collect();
        let plan = EditPlan::from_ops(ops);

        if !plan.is_empty() {
            let description = format!("Replace '{}' with '{}'", query.pattern, replacement);
            self.commit(&plan, Some(description))?;
            info!(replacements = count, paragraphs = plan.len(), "Replaced text");
        }
        Ok(count)
    }

    pub fn find(&self, query: &SearchQuery) -> Result<Vec<search::SearchMatch>, EditorError> {
        let pattern = query.compile()?;
        Ok(search::find_all(self.current()?.store(), &pattern))
    }

    pub fn stats(&self) -> Result<DocumentStats, EditorError> {
        Ok(DocumentStats::collect(self.current()?.store()))
    }

    pub fn structure(&self, preview_width: usize) -> Result<Vec<StructureEntry>, EditorError> {
        let store = self.current()?.store();
        Ok(stats::structure(store, preview_width, |s| self.adapter.style_label(s)))
    }

    pub fn outline(&self) -> Result<Vec<OutlineEntry>, EditorError> {
        let store = self.current()?.store();
        Ok(stats::outline(store, |s| self.adapter.style_label(s)))
    }
}
