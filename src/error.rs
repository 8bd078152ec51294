use thiserror::Error;

use crate::model::position::Position;

/// Failure reported by a document when it refuses a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("document is read-only")]
    ReadOnly,
    #[error("position {0} is outside the accessible region")]
    Inaccessible(Position),
    #[error("position {0} does not exist in the document")]
    InvalidPosition(Position),
    #[error("cannot move a selection into itself")]
    OverlappingMove,
}

/// Why a requested interaction had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("document is read-only")]
    ReadOnly,
    #[error("rectangular text cannot be dropped onto bidirectional lines")]
    BidirectionalTarget,
    #[error("drop point is outside the editable region")]
    OutsideEditableRegion,
    #[error("dragged data is not text")]
    DataUnavailable,
    #[error("drop point is inside the dragged selection")]
    DropIntoSelection,
    #[error("no drag session is active")]
    NoSession,
    #[error("document refused the edit: {0}")]
    MutationFailed(#[from] EditError),
}
