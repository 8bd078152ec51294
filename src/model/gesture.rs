use std::ops::Range;

use crate::engine::drag_drop::{DragData, EffectMask};
use crate::model::geometry::Point;

/// Where a drag session's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The drag started from this viewport's own selection.
    SameViewport,
    External,
}

/// An in-flight drag, outgoing or incoming.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub data: DragData,
    /// Number of lines in rectangular content, zero for linear content.
    pub rectangular_lines: usize,
    pub provenance: Provenance,
    pub allowed: EffectMask,
    pub last_point: Point,
}

impl DragSession {
    pub fn is_rectangular(&self) -> bool {
        self.data.is_rectangular()
    }
}

/// Live auto-scroll measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoScrollTelemetry {
    pub origin: Point,
    pub pointer: Point,
    /// Signed line distance from the origin, truncated toward zero.
    pub degree: i32,
}

impl AutoScrollTelemetry {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            pointer: origin,
            degree: 0,
        }
    }

    /// Records a new pointer point and recomputes the degree.
    pub fn track(&mut self, pointer: Point, line_pitch: i32) {
        self.pointer = pointer;
        self.degree = (pointer.y - self.origin.y) / line_pitch.max(1);
    }
}

/// The single interaction state of a viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    ExtendingCharacter,
    ExtendingWord {
        initial_line: usize,
        initial_word_columns: Range<usize>,
    },
    ExtendingLine {
        initial_line: usize,
    },
    /// Pressed over the selection; waiting for the pointer to leave the threshold box.
    ApproachingDrag {
        origin: Point,
    },
    DraggingOut(DragSession),
    DragTargetHover(DragSession),
    ApproachingAutoScroll {
        origin: Point,
    },
    AutoScrollDragging(AutoScrollTelemetry),
    AutoScrollTimed(AutoScrollTelemetry),
}

impl GestureState {
    pub fn label(&self) -> &'static str {
        match self {
            GestureState::Idle => "IDLE",
            GestureState::ExtendingCharacter => "SELECT",
            GestureState::ExtendingWord { .. } => "SELECT WORD",
            GestureState::ExtendingLine { .. } => "SELECT LINE",
            GestureState::ApproachingDrag { .. } => "DRAG?",
            GestureState::DraggingOut(_) => "DRAG",
            GestureState::DragTargetHover(_) => "DROP",
            GestureState::ApproachingAutoScroll { .. } => "SCROLL?",
            GestureState::AutoScrollDragging(_) | GestureState::AutoScrollTimed(_) => "AUTOSCROLL",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    pub fn is_extending(&self) -> bool {
        matches!(
            self,
            GestureState::ExtendingCharacter
                | GestureState::ExtendingWord { .. }
                | GestureState::ExtendingLine { .. }
        )
    }

    pub fn is_auto_scrolling(&self) -> bool {
        matches!(
            self,
            GestureState::AutoScrollDragging(_) | GestureState::AutoScrollTimed(_)
        )
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        match self {
            GestureState::DraggingOut(session) | GestureState::DragTargetHover(session) => {
                Some(session)
            }
            _ => None,
        }
    }

    pub fn drag_session_mut(&mut self) -> Option<&mut DragSession> {
        match self {
            GestureState::DraggingOut(session) | GestureState::DragTargetHover(session) => {
                Some(session)
            }
            _ => None,
        }
    }

    pub fn telemetry(&self) -> Option<&AutoScrollTelemetry> {
        match self {
            GestureState::AutoScrollDragging(t) | GestureState::AutoScrollTimed(t) => Some(t),
            _ => None,
        }
    }

    pub fn telemetry_mut(&mut self) -> Option<&mut AutoScrollTelemetry> {
        match self {
            GestureState::AutoScrollDragging(t) | GestureState::AutoScrollTimed(t) => Some(t),
            _ => None,
        }
    }
}
