//! # Paragraph Operations
//!
//! The output of reconciliation and the input of [`ParagraphStore::apply`].
//!
//! ## Operation Semantics
//!
//! ### Delete
//! - `index` addresses the store *before* the plan is applied
//! - Removes the paragraph and hands its style back to the container as removed
//!
//! ### Update
//! - `index` addresses the store *before* the plan is applied
//! - Atomic text replacement; the paragraph keeps its style
//!
//! ### Insert
//! - `position` is the paragraph's index *after* the plan is applied
//! - `after` names the surviving paragraph it follows (old index), or `None`
//!   when it precedes every survivor
//! - Carries no style; the container assigns its default
//!
//! [`ParagraphStore::apply`]: crate::ParagraphStore::apply

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A paragraph-level operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParagraphOp {
    Update {
        index: usize,
        text: String,
    },

    Insert {
        after: Option<usize>,
        position: usize,
        text: String,
    },

    Delete {
        index: usize,
    },
}

impl ParagraphOp {
    fn phase(&self) -> (u8, usize) {
        // Deletes highest index first, then updates and inserts ascending.
        match self {
            ParagraphOp::Delete { index } => (0, usize::MAX - index),
            ParagraphOp::Update { index, .. } => (1, *index),
            ParagraphOp::Insert { position, .. } => (2, *position),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("invalid operation: paragraph {index} out of range (store has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid operation: paragraph {index} targeted twice")]
    DuplicateTarget { index: usize },

    #[error("invalid operation: paragraph {index} is both updated and deleted")]
    UpdateOfDeleted { index: usize },

    #[error("invalid operation: insert anchored to deleted paragraph {index}")]
    AnchorDeleted { index: usize },

    #[error("invalid operation: two inserts at position {position}")]
    DuplicatePosition { position: usize },

    #[error("invalid operation: insert position {position} past end ({len})")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Ordered list of operations produced by one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPlan {
    ops: Vec<ParagraphOp>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan, putting `ops` into application order
    pub fn from_ops(mut ops: Vec<ParagraphOp>) -> Self {
        ops.sort_by_key(ParagraphOp::phase);
        Self { ops }
    }

    pub fn ops(&self) -> &[ParagraphOp] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParagraphOp> {
        self.ops.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for op in &self.ops {
            match op {
                ParagraphOp::Update { .. } => summary.updated += 1,
                ParagraphOp::Insert { .. } => summary.inserted += 1,
                ParagraphOp::Delete { .. } => summary.deleted += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a EditPlan {
    type Item = &'a ParagraphOp;
    type IntoIter = std::slice::Iter<'a, ParagraphOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Operation counts of a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub updated: usize,
    pub inserted: usize,
    pub deleted: usize,
}
