//! Outgoing and incoming drag-and-drop of text.
//!
//! [`DragDropCoordinator`] plays both roles through the [`DragSource`] and
//! [`DropTarget`] traits. A drag that starts and ends in the same viewport
//! stays in `DraggingOut` while it hovers here; an external drag hovers in
//! `DragTargetHover`.

use std::time::Instant;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::engine::hit_test::HitTester;
use crate::engine::input::{Buttons, Modifiers};
use crate::engine::scheduler::{Scheduler, TimerHandle, TimerOwner};
use crate::error::RejectionReason;
use crate::model::config::EngineConfig;
use crate::model::geometry::{Point, Rect};
use crate::model::gesture::{DragSession, GestureState, Provenance};
use crate::model::position::{Position, Region, SelectionShape};
use crate::surface::{Bias, Surface};

bitflags! {
    /// Drop effects. The empty mask means "none".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EffectMask: u8 {
        const COPY = 1 << 0;
        const MOVE = 1 << 1;
        /// The target scrolled while hovering.
        const SCROLL = 1 << 2;
    }
}

/// Clipboard-style format tag of one drag payload item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    PlainText,
    /// Marker item: the plain text is a rectangular block, one row per line.
    RectangleText,
    Other(String),
}

/// Payload carried by a drag. Usually one or two items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragData {
    items: SmallVec<[(Format, Vec<u8>); 2]>,
}

impl DragData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: &str) -> Self {
        Self::new().with(Format::PlainText, text.as_bytes().to_vec())
    }

    pub fn rectangle(text: &str) -> Self {
        Self::text(text).with(Format::RectangleText, Vec::new())
    }

    pub fn with(mut self, format: Format, bytes: Vec<u8>) -> Self {
        self.items.push((format, bytes));
        self
    }

    pub fn get(&self, format: &Format) -> Option<&[u8]> {
        self.items
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, bytes)| bytes.as_slice())
    }

    pub fn is_rectangular(&self) -> bool {
        self.get(&Format::RectangleText).is_some()
    }

    /// The payload as text, if it carries decodable plain text.
    pub fn plain_text(&self) -> Result<&str, RejectionReason> {
        let bytes = self
            .get(&Format::PlainText)
            .ok_or(RejectionReason::DataUnavailable)?;
        std::str::from_utf8(bytes).map_err(|_| RejectionReason::DataUnavailable)
    }

    /// Rows in rectangular content, zero for linear content.
    fn rectangular_lines(&self) -> usize {
        if !self.is_rectangular() {
            return 0;
        }
        self.plain_text().map_or(0, |text| {
            let text = text.strip_suffix('\n').unwrap_or(text);
            text.split('\n').count()
        })
    }
}

/// Answer to the drag service's periodic "keep going?" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Continue,
    Drop,
    Cancel,
}

/// Borrowed engine state handed to the drag-and-drop roles.
pub struct DragContext<'s, 'a> {
    pub state: &'s mut GestureState,
    pub surface: &'s mut Surface<'a>,
    pub scheduler: &'s mut Scheduler,
    pub now: Instant,
}

pub trait DragSource {
    /// Starts an outgoing drag of the current selection; returns the payload
    /// for the drag service, or `None` when there is nothing to drag.
    fn begin_drag(&mut self, cx: &mut DragContext<'_, '_>, point: Point) -> Option<DragData>;

    fn query_continue(&self, escape: bool, buttons: Buttons) -> DragAction;

    /// Finishes the outgoing drag with the effect the target reported.
    fn end_drag(&mut self, cx: &mut DragContext<'_, '_>, effect: EffectMask);
}

pub trait DropTarget {
    fn drag_enter(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
    ) -> EffectMask;

    fn drag_over(&mut self, cx: &mut DragContext<'_, '_>, point: Point, modifiers: Modifiers)
    -> EffectMask;

    fn drag_leave(&mut self, cx: &mut DragContext<'_, '_>);

    fn drop(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
    ) -> EffectMask;
}

#[derive(Debug)]
pub struct DragDropCoordinator {
    config: EngineConfig,
    scroll_timer: Option<TimerHandle>,
    /// Set when an outgoing drag was dropped back onto this viewport.
    dropped_here: bool,
}

impl DragDropCoordinator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            scroll_timer: None,
            dropped_here: false,
        }
    }

    /// Press over a non-empty selection: wait for the pointer to leave the threshold box.
    pub fn approach(&mut self, state: &mut GestureState, origin: Point) {
        tracing::debug!(?origin, "approaching drag");
        *state = GestureState::ApproachingDrag { origin };
    }

    /// Pointer moved while approaching. Returns the payload once a drag begins.
    pub fn track_approach(&mut self, cx: &mut DragContext<'_, '_>, point: Point) -> Option<DragData> {
        let GestureState::ApproachingDrag { origin } = *cx.state else {
            return None;
        };
        if cx.surface.document.selection().is_empty() {
            tracing::debug!("selection vanished while approaching drag");
            *cx.state = GestureState::Idle;
            return None;
        }
        if !origin.exceeds(point, self.config.drag_threshold()) {
            return None;
        }
        self.begin_drag(cx, point)
    }

    /// Release before the drag began: drop the pending drag and put the caret at `point`.
    pub fn release_approach(&mut self, cx: &mut DragContext<'_, '_>, point: Point) {
        if !matches!(cx.state, GestureState::ApproachingDrag { .. }) {
            return;
        }
        let caret = cx.surface.layout.position_for(cx.surface.text(), point, Bias::Leading);
        cx.surface.document.select(caret, caret, SelectionShape::Linear);
        cx.surface.layout.request_redraw();
        *cx.state = GestureState::Idle;
    }

    /// Discards any session without touching the document.
    pub fn cancel(&mut self, state: &mut GestureState, scheduler: &mut Scheduler) {
        scheduler.cancel_slot(&mut self.scroll_timer);
        self.dropped_here = false;
        if matches!(
            state,
            GestureState::ApproachingDrag { .. }
                | GestureState::DraggingOut(_)
                | GestureState::DragTargetHover(_)
        ) {
            *state = GestureState::Idle;
        }
    }

    /// Drag-scroll timer fired: keep edge-scrolling while the pointer rests in the band.
    pub fn on_timer(&mut self, cx: &mut DragContext<'_, '_>, handle: TimerHandle) {
        if self.scroll_timer != Some(handle) {
            return;
        }
        self.scroll_timer = None;
        let Some(session) = cx.state.drag_session() else {
            return;
        };
        let (point, rectangular) = (session.last_point, session.is_rectangular());
        if self.edge_scroll(cx, point) {
            self.scroll_timer = Some(cx.scheduler.schedule(
                TimerOwner::DragScroll,
                self.config.drag_scroll_interval(rectangular),
                cx.now,
            ));
        }
    }

    fn drop_point(cx: &DragContext<'_, '_>, point: Point) -> Position {
        cx.surface.layout.position_for(cx.surface.text(), point, Bias::Leading)
    }

    /// Whether `session`'s content may land at `dest`.
    fn evaluate(
        &self,
        cx: &DragContext<'_, '_>,
        session: &DragSession,
        dest: Position,
    ) -> Result<(), RejectionReason> {
        let document = &*cx.surface.document;
        if document.is_read_only() || !document.can_paste() {
            return Err(RejectionReason::ReadOnly);
        }
        if session.rectangular_lines > 0 {
            let last = document.line_count().min(dest.line + session.rectangular_lines);
            let text = cx.surface.text();
            if (dest.line..last).any(|line| cx.surface.layout.line_is_bidirectional(text, line)) {
                return Err(RejectionReason::BidirectionalTarget);
            }
        }
        // Rows past the end of the document are appended there.
        let accessible = document.accessible_region();
        let last_line = dest.line + session.rectangular_lines.saturating_sub(1);
        let last_row = if last_line < document.line_count() {
            Position::new(last_line, dest.column)
        } else {
            document.end_position()
        };
        if !accessible.includes(dest) || !accessible.includes(last_row) {
            return Err(RejectionReason::OutsideEditableRegion);
        }
        session.data.plain_text()?;
        Ok(())
    }

    /// Copy with the copy modifier, move otherwise, limited to what the source allows.
    fn requested_effect(&self, allowed: EffectMask, modifiers: Modifiers) -> EffectMask {
        let wanted = if modifiers.intersects(self.config.modifiers.copy) {
            EffectMask::COPY
        } else {
            EffectMask::MOVE
        };
        if allowed.contains(wanted) {
            wanted
        } else {
            allowed & EffectMask::COPY
        }
    }

    /// Effect to report while hovering at `point`.
    fn hover_effect(&self, cx: &DragContext<'_, '_>, point: Point, modifiers: Modifiers) -> EffectMask {
        let Some(session) = cx.state.drag_session() else {
            return EffectMask::empty();
        };
        let dest = Self::drop_point(cx, point);
        if let Err(reason) = self.evaluate(cx, session, dest) {
            tracing::debug!(%reason, %dest, "drop refused");
            return EffectMask::empty();
        }
        if session.provenance == Provenance::SameViewport {
            let hits = HitTester::new(&*cx.surface.layout, cx.surface.text());
            if hits.is_over_selection(point, &cx.surface.document.selection()) {
                return EffectMask::empty();
            }
        }
        self.requested_effect(session.allowed, modifiers)
    }

    /// Scrolls one line, or the configured columns, when `point` sits in an edge band.
    fn edge_scroll(&self, cx: &mut DragContext<'_, '_>, point: Point) -> bool {
        let (dx, dy) = edge_direction(
            cx.surface.layout.geometry().text_area(),
            point,
            cx.surface.layout.line_pitch(),
            cx.surface.layout.average_char_width(),
            self.config.drag_drop.edge_margin,
        );
        if dy != 0 {
            cx.surface.scroll(0, dy);
        } else if dx != 0 {
            cx.surface.scroll(dx * self.config.drag_drop.edge_scroll_columns, 0);
        } else {
            return false;
        }
        true
    }

    /// Updates the hover point and edge-scrolls unless the drag-scroll timer is already pacing it.
    fn hover(&mut self, cx: &mut DragContext<'_, '_>, point: Point) -> EffectMask {
        let Some(session) = cx.state.drag_session_mut() else {
            return EffectMask::empty();
        };
        session.last_point = point;
        let rectangular = session.is_rectangular();

        let pending = self.scroll_timer.is_some_and(|h| cx.scheduler.is_pending(h));
        if pending {
            let band = edge_direction(
                cx.surface.layout.geometry().text_area(),
                point,
                cx.surface.layout.line_pitch(),
                cx.surface.layout.average_char_width(),
                self.config.drag_drop.edge_margin,
            );
            return if band != (0, 0) { EffectMask::SCROLL } else { EffectMask::empty() };
        }
        if self.edge_scroll(cx, point) {
            self.scroll_timer = Some(cx.scheduler.schedule(
                TimerOwner::DragScroll,
                self.config.drag_scroll_interval(rectangular),
                cx.now,
            ));
            EffectMask::SCROLL
        } else {
            EffectMask::empty()
        }
    }

    /// Inserts `text` at `dest` and selects what was inserted. On failure the
    /// previous selection is restored.
    fn insert_at(
        cx: &mut DragContext<'_, '_>,
        dest: Position,
        text: &str,
        rectangular: bool,
    ) -> Result<Region, RejectionReason> {
        let document = &mut *cx.surface.document;
        let saved = document.selection();
        document.select(dest, dest, SelectionShape::Linear);
        match document.replace_selection(text, rectangular) {
            Ok(inserted) => {
                let shape = if rectangular {
                    SelectionShape::Rectangular
                } else {
                    SelectionShape::Linear
                };
                document.select(inserted.beginning(), inserted.end(), shape);
                Ok(inserted)
            }
            Err(err) => {
                document.select(saved.anchor, saved.active, saved.shape);
                Err(err.into())
            }
        }
    }

    fn drop_same_viewport(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        session: &DragSession,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<EffectMask, RejectionReason> {
        let dest = Self::drop_point(cx, point);
        self.evaluate(cx, session, dest)?;
        self.dropped_here = true;

        let selection = cx.surface.document.selection();
        let hits = HitTester::new(&*cx.surface.layout, cx.surface.text());
        if hits.is_over_selection(point, &selection) || selection.covers(dest) {
            cx.surface.document.select(dest, dest, SelectionShape::Linear);
            return Err(RejectionReason::DropIntoSelection);
        }

        let effect = self.requested_effect(session.allowed, modifiers);
        if effect.contains(EffectMask::MOVE) {
            let landed = cx.surface.document.move_selection_to(dest)?;
            tracing::debug!(%landed, "moved selection");
        } else {
            let text = session.data.plain_text()?;
            let inserted = Self::insert_at(cx, dest, text, session.is_rectangular())?;
            tracing::debug!(%inserted, "copied selection");
        }
        Ok(effect)
    }

    fn drop_external(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        session: &DragSession,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<EffectMask, RejectionReason> {
        let dest = Self::drop_point(cx, point);
        self.evaluate(cx, session, dest)?;
        let text = session.data.plain_text()?;
        let inserted = Self::insert_at(cx, dest, text, session.is_rectangular())?;
        tracing::debug!(%inserted, "inserted dropped text");
        Ok(self.requested_effect(session.allowed, modifiers))
    }
}

impl DragSource for DragDropCoordinator {
    fn begin_drag(&mut self, cx: &mut DragContext<'_, '_>, point: Point) -> Option<DragData> {
        let document = &*cx.surface.document;
        let selection = document.selection();
        if selection.is_empty() {
            *cx.state = GestureState::Idle;
            return None;
        }
        let text = document.selected_text();
        let data = if selection.is_rectangular() {
            DragData::rectangle(&text)
        } else {
            DragData::text(&text)
        };
        let mut allowed = EffectMask::COPY;
        if !document.is_read_only() {
            allowed |= EffectMask::MOVE;
        }
        let session = DragSession {
            rectangular_lines: data.rectangular_lines(),
            data: data.clone(),
            provenance: Provenance::SameViewport,
            allowed,
            last_point: point,
        };
        tracing::debug!(rectangular = session.is_rectangular(), ?allowed, "drag started");
        self.dropped_here = false;
        *cx.state = GestureState::DraggingOut(session);
        Some(data)
    }

    fn query_continue(&self, escape: bool, buttons: Buttons) -> DragAction {
        if escape || buttons.contains(Buttons::SECONDARY) {
            DragAction::Cancel
        } else if !buttons.contains(Buttons::PRIMARY) {
            DragAction::Drop
        } else {
            DragAction::Continue
        }
    }

    fn end_drag(&mut self, cx: &mut DragContext<'_, '_>, effect: EffectMask) {
        if !matches!(cx.state, GestureState::DraggingOut(_)) {
            return;
        }
        // An external target that took a move leaves the source to delete its copy.
        if effect.contains(EffectMask::MOVE) && !self.dropped_here {
            let rectangular = cx.surface.document.selection().is_rectangular();
            if let Err(err) = cx.surface.document.replace_selection("", rectangular) {
                tracing::warn!(%err, "could not remove moved text");
            }
        }
        tracing::debug!(?effect, "drag ended");
        cx.scheduler.cancel_slot(&mut self.scroll_timer);
        self.dropped_here = false;
        cx.surface.layout.request_redraw();
        *cx.state = GestureState::Idle;
    }
}

impl DropTarget for DragDropCoordinator {
    fn drag_enter(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
    ) -> EffectMask {
        match *cx.state {
            GestureState::DraggingOut(_) => {}
            GestureState::Idle => {
                tracing::debug!("external drag entered");
                *cx.state = GestureState::DragTargetHover(DragSession {
                    rectangular_lines: data.rectangular_lines(),
                    data: data.clone(),
                    provenance: Provenance::External,
                    allowed: EffectMask::COPY | EffectMask::MOVE,
                    last_point: point,
                });
            }
            _ => return EffectMask::empty(),
        }
        self.drag_over(cx, point, modifiers)
    }

    fn drag_over(&mut self, cx: &mut DragContext<'_, '_>, point: Point, modifiers: Modifiers) -> EffectMask {
        let scroll = self.hover(cx, point);
        self.hover_effect(cx, point, modifiers) | scroll
    }

    fn drag_leave(&mut self, cx: &mut DragContext<'_, '_>) {
        cx.scheduler.cancel_slot(&mut self.scroll_timer);
        if matches!(cx.state, GestureState::DragTargetHover(_)) {
            tracing::debug!("external drag left");
            *cx.state = GestureState::Idle;
        }
    }

    fn drop(
        &mut self,
        cx: &mut DragContext<'_, '_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
    ) -> EffectMask {
        cx.scheduler.cancel_slot(&mut self.scroll_timer);
        let outcome = match cx.state.clone() {
            GestureState::DraggingOut(session) => {
                self.drop_same_viewport(cx, &session, point, modifiers)
            }
            GestureState::DragTargetHover(session) => {
                *cx.state = GestureState::Idle;
                // The payload delivered at drop time is authoritative.
                let session = DragSession {
                    rectangular_lines: data.rectangular_lines(),
                    data: data.clone(),
                    ..session
                };
                self.drop_external(cx, &session, point, modifiers)
            }
            _ => Err(RejectionReason::NoSession),
        };
        cx.surface.layout.request_redraw();
        match outcome {
            Ok(effect) => effect,
            Err(RejectionReason::MutationFailed(err)) => {
                tracing::warn!(%err, "drop failed, document left unchanged");
                EffectMask::empty()
            }
            Err(reason) => {
                tracing::debug!(%reason, "drop had no effect");
                EffectMask::empty()
            }
        }
    }
}

/// Scroll direction for a pointer in an edge band of `area`: vertical wins.
pub fn edge_direction(area: Rect, point: Point, line_pitch: i32, char_width: i32, margin: i32) -> (i32, i32) {
    let vertical = (line_pitch / 2).max(margin).max(1);
    let horizontal = char_width.max(margin).max(1);
    if point.y < area.top + vertical {
        (0, -1)
    } else if point.y >= area.bottom - vertical {
        (0, 1)
    } else if point.x < area.left + horizontal {
        (-1, 0)
    } else if point.x >= area.right - horizontal {
        (1, 0)
    } else {
        (0, 0)
    }
}
