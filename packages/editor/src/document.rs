//! # Document Handle
//!
//! A Document is one opened container and its editing state: the paragraph
//! store plus the buffer and projection derived from it.
//!
//! ## Lifecycle
//!
//! ```text
//! Open → Project → Edit → Reconcile → Apply → Save
//!   ↓       ↓        ↓         ↓         ↓       ↓
//! Store  Buffer    Text    EditPlan    Store  Container
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::container::{ContainerAdapter, SourceParagraph};
use crate::model::{ParagraphStore, StoreState};
use crate::ops::EditPlan;
use crate::projector::{project, EditBuffer, Projection};
use crate::reconcile::reconcile;
use crate::EditorError;

/// Editable document
#[derive(Debug, Clone)]
pub struct Document {
    /// Container the store was loaded from
    pub path: PathBuf,

    /// Current version number (increments on each applied non-empty plan)
    pub version: u64,

    store: ParagraphStore,
    buffer: EditBuffer,
    projection: Projection,
}

impl Document {
    /// Open a container through `adapter`
    pub fn open<A>(adapter: &mut A, path: impl Into<PathBuf>) -> Result<Self, EditorError>
    where
        A: ContainerAdapter + ?Sized,
    {
        let path = path.into();
        let store = ParagraphStore::load(adapter, &path)?;
        info!(path = %path.display(), paragraphs = store.len(), "Opened document");
        Ok(Self::from_store(path, store))
    }

    /// Create a document from extracted paragraphs (no container round trip)
    pub fn from_paragraphs(path: impl Into<PathBuf>, paragraphs: Vec<SourceParagraph>) -> Self {
        Self::from_store(path.into(), ParagraphStore::from_source(paragraphs))
    }

    fn from_store(path: PathBuf, store: ParagraphStore) -> Self {
        let (buffer, projection) = project(&store);
        Self {
            path,
            version: 0,
            store,
            buffer,
            projection,
        }
    }

    pub fn store(&self) -> &ParagraphStore {
        &self.store
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// The buffer as editor text
    pub fn editable_text(&self) -> String {
        self.buffer.to_text()
    }

    /// Reconcile without applying
    pub fn plan(&self, buffer: &EditBuffer) -> Result<EditPlan, EditorError> {
        Ok(reconcile(&self.store, &self.projection, buffer)?)
    }

    /// Reconcile `buffer` and apply the result.
    ///
    /// On error the document is unchanged.
    pub fn apply_edits(&mut self, buffer: &EditBuffer) -> Result<EditPlan, EditorError> {
        let plan = self.plan(buffer)?;
        self.apply_plan(&plan)?;
        Ok(plan)
    }

    /// Apply an already computed plan
    pub fn apply_plan(&mut self, plan: &EditPlan) -> Result<(), EditorError> {
        if plan.is_empty() {
            return Ok(());
        }

        self.store.apply(plan)?;
        self.version += 1;
        self.reproject();
        Ok(())
    }

    /// Swap in a previously captured store (undo/redo)
    pub(crate) fn replace_store(&mut self, store: ParagraphStore) -> ParagraphStore {
        let previous = std::mem::replace(&mut self.store, store);
        self.version += 1;
        self.reproject();
        previous
    }

    fn reproject(&mut self) {
        let (buffer, projection) = project(&self.store);
        self.buffer = buffer;
        self.projection = projection;
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.store.has_changes()
    }

    /// Write to `target` (or back to `path`) and reload from what was written.
    ///
    /// If the write fails, the document is untouched. If the write succeeds
    /// but reloading fails, the error is returned and the document keeps its
    /// pre-save store, still pointing at the old path.
    pub fn save<A>(&mut self, adapter: &mut A, target: Option<&Path>) -> Result<(), EditorError>
    where
        A: ContainerAdapter + ?Sized,
    {
        let target = target.unwrap_or(self.path.as_path()).to_path_buf();
        let patch = self.store.serialize();

        adapter.write_container(&self.path, &target, &patch)?;

        let mut store = ParagraphStore::load(adapter, &target)?;
        store.mark_saved();

        info!(
            path = %target.display(),
            paragraphs = store.len(),
            removed = patch.removed.len(),
            "Saved document"
        );

        self.path = target;
        self.store = store;
        self.reproject();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    #[test]
    fn test_open_document() {
        let mut container = MemoryContainer::new();
        container.insert_file("memo.docx", &["Title", "Body"]);

        let doc = Document::open(&mut container, "memo.docx").unwrap();

        assert_eq!(doc.version, 0);
        assert!(!doc.is_dirty());
        assert_eq!(doc.state(), StoreState::Loaded);
        assert_eq!(doc.editable_text(), "Title\nBody\n");
    }

    #[test]
    fn test_document_version_increments() {
        let mut container = MemoryContainer::new();
        container.insert_file("memo.docx", &["Title"]);
        let mut doc = Document::open(&mut container, "memo.docx").unwrap();

        doc.apply_edits(&EditBuffer::from_text("Title\n")).unwrap();
        assert_eq!(doc.version, 0, "no-op edit leaves version alone");

        doc.apply_edits(&EditBuffer::from_text("New title\n")).unwrap();
        assert_eq!(doc.version, 1);
        assert!(doc.is_dirty());
        assert_eq!(doc.state(), StoreState::Reconciled);
    }

    #[test]
    fn test_save_reloads_and_clears_dirty() {
        let mut container = MemoryContainer::new();
        container.insert_file("memo.docx", &["a", "b"]);
        let mut doc = Document::open(&mut container, "memo.docx").unwrap();

        doc.apply_edits(&EditBuffer::from_text("a\nB\nc\n")).unwrap();
        doc.save(&mut container, None).unwrap();

        assert!(!doc.is_dirty());
        assert_eq!(doc.state(), StoreState::Saved);
        assert_eq!(
            container.texts(Path::new("memo.docx")).unwrap(),
            vec!["a", "B", "c"]
        );
        assert_eq!(doc.editable_text(), "a\nB\nc\n");
    }

    #[test]
    fn test_save_as_moves_path() {
        let mut container = MemoryContainer::new();
        container.insert_file("in.docx", &["a"]);
        let mut doc = Document::open(&mut container, "in.docx").unwrap();

        doc.apply_edits(&EditBuffer::from_text("z\n")).unwrap();
        doc.save(&mut container, Some(Path::new("out.docx"))).unwrap();

        assert_eq!(doc.path, PathBuf::from("out.docx"));
        assert_eq!(container.texts(Path::new("in.docx")).unwrap(), vec!["a"]);
        assert_eq!(container.texts(Path::new("out.docx")).unwrap(), vec!["z"]);
    }
}
