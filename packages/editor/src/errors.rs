//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Container(#[from] crate::container::ContainerError),

    #[error(transparent)]
    Reconcile(#[from] crate::reconcile::ReconcileError),

    #[error(transparent)]
    Operation(#[from] crate::ops::OperationError),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("No document is open")]
    NoDocument,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl EditorError {
    /// Errors the editing surface can recover from by asking the user again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EditorError::Reconcile(crate::reconcile::ReconcileError::MalformedBuffer { .. })
                | EditorError::Container(crate::container::ContainerError::Write { .. })
                | EditorError::InvalidPattern(_)
        )
    }
}
