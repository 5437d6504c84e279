//! # Undo/Redo Stack
//!
//! Tracks applied edit batches so they can be stepped back and forth.
//!
//! ## Design
//!
//! - Each applied plan records the store as it was *before* the plan
//! - Undo swaps that store back in and keeps the current one for redo
//! - New edits clear the redo stack
//! - Saving or opening a document clears all history (style tokens are only
//!   valid against the container they were loaded from)

use crate::document::Document;
use crate::model::ParagraphStore;

/// A store captured around one edit
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub store: ParagraphStore,
    pub description: Option<String>,
}

impl Snapshot {
    pub fn new(store: ParagraphStore) -> Self {
        Self {
            store,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stores before each applied edit (most recent last)
    undo_stack: Vec<Snapshot>,

    /// Stores undone (most recent last)
    redo_stack: Vec<Snapshot>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record the store as it was before an applied edit
    pub fn record(&mut self, before: Snapshot) {
        self.undo_stack.push(before);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Step back one edit. Returns false if there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };

        let current = doc.replace_store(snapshot.store);
        self.redo_stack.push(Snapshot {
            store: current,
            description: snapshot.description,
        });
        true
    }

    /// Step forward one undone edit. Returns false if there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };

        let current = doc.replace_store(snapshot.store);
        self.undo_stack.push(Snapshot {
            store: current,
            description: snapshot.description,
        });
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Description of the next undo step
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|snapshot| snapshot.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|snapshot| snapshot.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
