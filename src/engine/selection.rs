//! Character, word, line and rectangle selection by pointer.

use std::ops::Range;
use std::time::Instant;

use crate::engine::hit_test::Zone;
use crate::engine::input::Modifiers;
use crate::engine::scheduler::{Scheduler, TimerHandle, TimerOwner};
use crate::model::config::{EngineConfig, ModifierBindings};
use crate::model::geometry::{Point, Rect};
use crate::model::gesture::GestureState;
use crate::model::position::{Position, SelectionShape};
use crate::surface::{Bias, Surface, TextSource};

#[derive(Debug)]
pub struct SelectionController {
    bindings: ModifierBindings,
    observe_interval: std::time::Duration,
    observer: Option<TimerHandle>,
    last_point: Point,
}

impl SelectionController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bindings: config.modifiers.clone(),
            observe_interval: config.selection_observe_interval(),
            observer: None,
            last_point: Point::default(),
        }
    }

    /// The pointer point the selection was last extended toward.
    pub fn last_point(&self) -> Point {
        self.last_point
    }

    /// Starts a selection gesture for a primary press at `point` in `zone`.
    #[allow(clippy::too_many_arguments)]
    pub fn begin(
        &mut self,
        state: &mut GestureState,
        surface: &mut Surface<'_>,
        scheduler: &mut Scheduler,
        point: Point,
        zone: Zone,
        modifiers: Modifiers,
        double_click: bool,
        now: Instant,
    ) {
        let word_modifier = modifiers.intersects(self.bindings.word);
        let keep_anchor = modifiers.intersects(self.bindings.keep_anchor);
        self.last_point = point;

        if zone.is_ruler() {
            if word_modifier {
                let end = surface.text().end_position();
                surface.document.select(Position::default(), end, SelectionShape::Linear);
                surface.layout.request_redraw();
                tracing::debug!("selected whole document");
                *state = GestureState::Idle;
                return;
            }
            let to = surface.layout.position_for(surface.text(), point, Bias::Leading);
            let anchor_line = surface.document.selection().anchor.line;
            let initial_line = if keep_anchor { anchor_line } else { to.line };
            *state = GestureState::ExtendingLine { initial_line };
            extend_line(surface, initial_line, to);
        } else {
            let pos = surface.layout.position_for(surface.text(), point, Bias::Leading);
            let shape = if modifiers.intersects(self.bindings.rectangle) {
                SelectionShape::Rectangular
            } else {
                SelectionShape::Linear
            };
            if double_click || word_modifier {
                // With keep-anchor the initial word is the one at the anchor.
                let origin = if keep_anchor && !double_click {
                    surface.document.selection().anchor
                } else {
                    pos
                };
                let columns = surface.words.word_at(surface.text(), origin);
                surface.document.select(
                    Position::new(origin.line, columns.start),
                    Position::new(origin.line, columns.end),
                    shape,
                );
                *state = GestureState::ExtendingWord {
                    initial_line: origin.line,
                    initial_word_columns: columns.clone(),
                };
                if origin != pos {
                    extend_word(surface, origin.line, &columns, pos);
                }
            } else {
                let anchor = if keep_anchor {
                    surface.document.selection().anchor
                } else {
                    pos
                };
                surface.document.select(anchor, pos, shape);
                *state = GestureState::ExtendingCharacter;
            }
        }

        tracing::debug!(state = state.label(), "selection gesture started");
        surface.layout.request_redraw();
        scheduler.cancel_slot(&mut self.observer);
        self.observer = Some(scheduler.schedule(TimerOwner::SelectionObserver, self.observe_interval, now));
    }

    /// Extends the selection toward the pointer at `point`.
    pub fn extend(&mut self, state: &GestureState, surface: &mut Surface<'_>, point: Point) {
        if !state.is_extending() {
            return;
        }
        self.last_point = point;
        let dest = surface.layout.position_for(surface.text(), point, Bias::Leading);
        self.extend_to(state, surface, dest);
    }

    /// Extends the selection to `dest` according to the active gesture. No-op when idle.
    pub fn extend_to(&mut self, state: &GestureState, surface: &mut Surface<'_>, dest: Position) {
        match state {
            GestureState::ExtendingCharacter => {
                let current = surface.document.selection();
                surface.document.select(current.anchor, dest, current.shape);
            }
            GestureState::ExtendingLine { initial_line } => extend_line(surface, *initial_line, dest),
            GestureState::ExtendingWord {
                initial_line,
                initial_word_columns,
            } => extend_word(surface, *initial_line, initial_word_columns, dest),
            _ => return,
        }
        surface.layout.request_redraw();
    }

    pub fn release(&mut self, state: &mut GestureState, surface: &mut Surface<'_>, scheduler: &mut Scheduler) {
        if !state.is_extending() {
            return;
        }
        scheduler.cancel_slot(&mut self.observer);
        tracing::debug!(selection = %surface.document.selected_region(), "selection gesture ended");
        *state = GestureState::Idle;
        surface.layout.request_redraw();
    }

    pub fn cancel(&mut self, state: &mut GestureState, scheduler: &mut Scheduler) {
        scheduler.cancel_slot(&mut self.observer);
        if state.is_extending() {
            *state = GestureState::Idle;
        }
    }

    /// Observation tick: scrolls toward a pointer held outside the text area and re-extends.
    pub fn on_timer(
        &mut self,
        state: &GestureState,
        surface: &mut Surface<'_>,
        scheduler: &mut Scheduler,
        handle: TimerHandle,
        now: Instant,
    ) {
        if self.observer != Some(handle) {
            return;
        }
        self.observer = None;
        if !state.is_extending() {
            return;
        }

        let area = surface.layout.geometry().text_area();
        let point = self.last_point;
        let (dx, dy) = observer_scroll(
            area,
            point,
            surface.layout.line_pitch(),
            surface.layout.average_char_width(),
        );
        if (dx, dy) != (0, 0) {
            surface.scroll(dx, dy);
            let clamped = Point::new(
                point.x.clamp(area.left, (area.right - 1).max(area.left)),
                point.y.clamp(area.top, (area.bottom - 1).max(area.top)),
            );
            let dest = surface.layout.position_for(surface.text(), clamped, Bias::Leading);
            self.extend_to(state, surface, dest);
        }
        self.observer = Some(scheduler.schedule(TimerOwner::SelectionObserver, self.observe_interval, now));
    }
}

/// Lines (or columns) to scroll toward a pointer outside `area`, growing with
/// its distance from the edge. Vertical distance wins.
pub fn observer_scroll(area: Rect, point: Point, line_pitch: i32, char_width: i32) -> (i32, i32) {
    let (pitch, width) = (line_pitch.max(1), char_width.max(1));
    if point.y < area.top {
        (0, (point.y - area.top) / pitch - 1)
    } else if point.y >= area.bottom {
        (0, (point.y - area.bottom) / pitch + 1)
    } else if point.x < area.left {
        ((point.x - area.left) / width - 1, 0)
    } else if point.x >= area.right {
        ((point.x - area.right) / width + 1, 0)
    } else {
        (0, 0)
    }
}

/// Start of `line`, or the end of the document for lines past the last.
fn line_start(text: &dyn TextSource, line: usize) -> Position {
    if line >= text.line_count() {
        text.end_position()
    } else {
        Position::new(line, 0)
    }
}

/// Whole-line selection from `initial_line` through the line of `to`.
fn extend_line(surface: &mut Surface<'_>, initial_line: usize, to: Position) {
    let (anchor, active) = if to.line >= initial_line {
        (initial_line, to.line + 1)
    } else {
        (initial_line + 1, to.line)
    };
    let text = surface.text();
    let (anchor, active) = (line_start(text, anchor), line_start(text, active));
    surface.document.select(anchor, active, SelectionShape::Linear);
}

/// Word-wise selection that always keeps the initial word.
fn extend_word(surface: &mut Surface<'_>, line: usize, word: &Range<usize>, dest: Position) {
    let start = Position::new(line, word.start);
    let end = Position::new(line, word.end);
    let text = surface.text();
    let (anchor, active) = if dest < start {
        (end, surface.words.word_start(text, dest))
    } else if dest > end {
        (start, surface.words.word_end(text, dest))
    } else {
        (start, end)
    };
    let shape = surface.document.selection().shape;
    surface.document.select(anchor, active, shape);
}
