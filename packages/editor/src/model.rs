//! # Paragraph Store
//!
//! The authoritative structural model of an open document: an ordered list of
//! paragraph records extracted from a container.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty → Loaded → Reconciled ⟲ → Saved
//!           ↑                       │
//!           └───────────────────────┘  (Saved behaves like Loaded)
//! ```
//!
//! The store is only ever mutated through [`ParagraphStore::apply`], which
//! either commits a whole [`EditPlan`] or leaves the store untouched.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::{
    ContainerAdapter, ContainerError, ContainerPatch, PatchEntry, SourceParagraph,
};
use crate::ops::{EditPlan, OperationError, ParagraphOp};

/// Opaque handle to a paragraph's non-text formatting.
///
/// Minted by a [`ContainerAdapter`] and only ever handed back to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRef(String);

impl StyleRef {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the adapter that minted it
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single paragraph record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position in the document (dense, 0-based)
    pub index: usize,

    /// Visible plain text. May contain `\n` (soft breaks) and `\t`.
    pub text: String,

    /// Formatting handle. `None` for paragraphs inserted since load.
    pub style: Option<StyleRef>,

    /// Text changed (or paragraph inserted) since load
    pub dirty: bool,
}

impl Paragraph {
    pub fn is_inserted(&self) -> bool {
        self.style.is_none()
    }
}

/// Lifecycle state of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreState {
    Empty,
    Loaded,
    Reconciled,
    Saved,
}

/// Ordered, exclusively owned sequence of paragraphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphStore {
    paragraphs: Vec<Paragraph>,

    /// Styles of source paragraphs deleted since load
    removed: Vec<StyleRef>,

    state: StoreState,
}

impl Default for ParagraphStore {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            removed: Vec::new(),
            state: StoreState::Empty,
        }
    }
}

impl ParagraphStore {
    /// Load a container through an adapter
    pub fn load<A>(adapter: &mut A, path: &Path) -> Result<Self, ContainerError>
    where
        A: ContainerAdapter + ?Sized,
    {
        let source = adapter.load_container(path)?;
        debug!(path = %path.display(), paragraphs = source.len(), "Loaded container");
        Ok(Self::from_source(source))
    }

    /// Build a store from already-extracted paragraphs
    pub fn from_source(source: Vec<SourceParagraph>) -> Self {
        let paragraphs = source
            .into_iter()
            .enumerate()
            .map(|(index, p)| Paragraph {
                index,
                text: p.text,
                style: Some(p.style),
                dirty: false,
            })
            .collect();

        Self {
            paragraphs,
            removed: Vec::new(),
            state: StoreState::Loaded,
        }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn get(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Styles of source paragraphs removed since load
    pub fn removed(&self) -> &[StyleRef] {
        &self.removed
    }

    /// True when serializing would change the container
    pub fn has_changes(&self) -> bool {
        !self.removed.is_empty() || self.paragraphs.iter().any(|p| p.dirty)
    }

    pub(crate) fn mark_saved(&mut self) {
        self.state = StoreState::Saved;
    }

    /// Apply a reconciliation plan.
    ///
    /// `Delete`/`Update` indices address the store as it is now; `Insert`
    /// positions address the resulting store. Validation runs to completion
    /// before anything is touched, so on error `self` is unchanged.
    pub fn apply(&mut self, plan: &EditPlan) -> Result<(), OperationError> {
        let len = self.paragraphs.len();

        let mut deleted = HashSet::new();
        for op in plan.iter() {
            if let ParagraphOp::Delete { index } = op {
                if *index >= len {
                    return Err(OperationError::IndexOutOfRange { index: *index, len });
                }
                if !deleted.insert(*index) {
                    return Err(OperationError::DuplicateTarget { index: *index });
                }
            }
        }

        let mut updates: Vec<Option<&str>> = vec![None; len];
        for op in plan.iter() {
            if let ParagraphOp::Update { index, text } = op {
                if *index >= len {
                    return Err(OperationError::IndexOutOfRange { index: *index, len });
                }
                if deleted.contains(index) {
                    return Err(OperationError::UpdateOfDeleted { index: *index });
                }
                if updates[*index].replace(text.as_str()).is_some() {
                    return Err(OperationError::DuplicateTarget { index: *index });
                }
            }
        }

        let mut inserts: Vec<(usize, &str)> = Vec::new();
        for op in plan.iter() {
            if let ParagraphOp::Insert { after, position, text } = op {
                if let Some(anchor) = after {
                    if *anchor >= len {
                        return Err(OperationError::IndexOutOfRange { index: *anchor, len });
                    }
                    if deleted.contains(anchor) {
                        return Err(OperationError::AnchorDeleted { index: *anchor });
                    }
                }
                inserts.push((*position, text.as_str()));
            }
        }
        inserts.sort_by_key(|(position, _)| *position);

        let survivors = len - deleted.len();
        for (k, (position, _)) in inserts.iter().enumerate() {
            if k > 0 && inserts[k - 1].0 == *position {
                return Err(OperationError::DuplicatePosition { position: *position });
            }
            if *position > survivors + k {
                return Err(OperationError::PositionOutOfRange {
                    position: *position,
                    len: survivors + k,
                });
            }
        }

        // Everything validated; build the next generation off to the side.
        let mut removed = Vec::new();
        let mut next = Vec::with_capacity(survivors + inserts.len());
        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            if deleted.contains(&index) {
                if let Some(style) = &paragraph.style {
                    removed.push(style.clone());
                }
                continue;
            }
            let mut paragraph = paragraph.clone();
            if let Some(text) = updates[index] {
                paragraph.text = text.to_string();
                paragraph.dirty = true;
            }
            next.push(paragraph);
        }

        for (position, text) in inserts {
            next.insert(
                position,
                Paragraph {
                    index: position,
                    text: text.to_string(),
                    style: None,
                    dirty: true,
                },
            );
        }

        for (index, paragraph) in next.iter_mut().enumerate() {
            paragraph.index = index;
        }

        self.paragraphs = next;
        self.removed.extend(removed);
        self.state = StoreState::Reconciled;

        Ok(())
    }

    /// Describe the store as a patch for the container adapter
    pub fn serialize(&self) -> ContainerPatch {
        let entries = self
            .paragraphs
            .iter()
            .map(|p| match (&p.style, p.dirty) {
                (Some(style), false) => PatchEntry::Keep {
                    style: style.clone(),
                },
                (Some(style), true) => PatchEntry::Rewrite {
                    style: style.clone(),
                    text: p.text.clone(),
                },
                (None, _) => PatchEntry::Insert {
                    text: p.text.clone(),
                },
            })
            .collect();

        ContainerPatch {
            entries,
            removed: self.removed.clone(),
        }
    }
}
