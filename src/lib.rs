//! Pointer and keyboard interaction engine for a scrollable text viewport.
//!
//! Hosts feed raw input into an [`InputDispatcher`] together with a
//! [`Surface`] that borrows their document, layout and word-break rules for
//! the duration of the call. Time is passed in explicitly; hosts call
//! [`InputDispatcher::tick`] to fire timers.

pub mod engine;
pub mod error;
pub mod model;
pub mod surface;

pub use engine::dispatcher::InputDispatcher;
pub use engine::drag_drop::{DragAction, DragData, DragSource, DropTarget, EffectMask, Format};
pub use engine::hit_test::{HitTester, Zone};
pub use engine::input::{Buttons, CursorShape, Handled, Key, Modifiers, PointerButton, ScrollIndicator};
pub use error::{EditError, RejectionReason};
pub use model::config::EngineConfig;
pub use model::geometry::{Point, Rect, RulerAlignment, ViewportGeometry};
pub use model::gesture::{AutoScrollTelemetry, DragSession, GestureState, Provenance};
pub use model::position::{Position, Region, Selection, SelectionShape};
pub use surface::{Bias, Document, Layout, Surface, TextSource, WordBreaker};
