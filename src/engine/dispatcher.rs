//! The single entry point for viewport input.
//!
//! Owns the gesture state, the timer scheduler and the three controllers, and
//! routes every event to at most one of them.

use std::time::Instant;

use crate::engine::auto_scroll::AutoScrollController;
use crate::engine::drag_drop::{
    DragAction, DragContext, DragData, DragDropCoordinator, DragSource, DropTarget, EffectMask,
};
use crate::engine::hit_test::{HitTester, Zone};
use crate::engine::input::{Buttons, CursorShape, Handled, Key, Modifiers, PointerButton, ScrollIndicator};
use crate::engine::scheduler::{Scheduler, TimerOwner};
use crate::engine::selection::SelectionController;
use crate::model::config::EngineConfig;
use crate::model::geometry::Point;
use crate::model::gesture::GestureState;
use crate::surface::Surface;

#[derive(Debug)]
pub struct InputDispatcher {
    config: EngineConfig,
    state: GestureState,
    scheduler: Scheduler,
    selection: SelectionController,
    drag_drop: DragDropCoordinator,
    auto_scroll: AutoScrollController,
    /// Button whose events belong to the active gesture.
    capture: Option<PointerButton>,
    /// Payload of a drag started by pointer movement, waiting for the host.
    started_drag: Option<DragData>,
}

impl InputDispatcher {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            selection: SelectionController::new(&config),
            auto_scroll: AutoScrollController::new(&config),
            drag_drop: DragDropCoordinator::new(config.clone()),
            config,
            state: GestureState::Idle,
            scheduler: Scheduler::new(),
            capture: None,
            started_drag: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn pointer_pressed(
        &mut self,
        surface: &mut Surface<'_>,
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
        now: Instant,
    ) -> Handled {
        if self.is_auto_scroll_state() {
            // Any press ends auto-scroll, including the second middle press of timed mode.
            self.auto_scroll.stop(&mut self.state, surface, &mut self.scheduler);
            self.capture = None;
            return Handled::Yes;
        }
        if let Some(owner) = self.capture
            && owner != button
        {
            return Handled::No;
        }

        match button {
            PointerButton::Primary => self.primary_press(surface, point, modifiers, false, now),
            PointerButton::Middle => {
                if self.auto_scroll.approach(&mut self.state, surface, point) {
                    self.capture = Some(PointerButton::Middle);
                    Handled::Yes
                } else {
                    Handled::No
                }
            }
            PointerButton::Secondary | PointerButton::Extra1 | PointerButton::Extra2 => Handled::No,
        }
    }

    /// A second primary press within the host's double-click window.
    pub fn pointer_double_clicked(
        &mut self,
        surface: &mut Surface<'_>,
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
        now: Instant,
    ) -> Handled {
        if button != PointerButton::Primary {
            return self.pointer_pressed(surface, point, button, modifiers, now);
        }
        if self.is_auto_scroll_state() {
            self.auto_scroll.stop(&mut self.state, surface, &mut self.scheduler);
            self.capture = None;
            return Handled::Yes;
        }
        self.primary_press(surface, point, modifiers, true, now)
    }

    fn primary_press(
        &mut self,
        surface: &mut Surface<'_>,
        point: Point,
        modifiers: Modifiers,
        double_click: bool,
        now: Instant,
    ) -> Handled {
        if !self.state.is_idle() {
            tracing::debug!(state = self.state.label(), "press interrupts gesture");
            self.reset(surface);
        }

        let zone = HitTester::new(&*surface.layout, surface.text()).classify(point);
        if zone == Zone::OutsideClient {
            return Handled::No;
        }

        if !zone.is_ruler() && !double_click {
            let selection = surface.document.selection();
            let over = HitTester::new(&*surface.layout, surface.text()).is_over_selection(point, &selection);
            if over {
                self.drag_drop.approach(&mut self.state, point);
                self.capture = Some(PointerButton::Primary);
                return Handled::Yes;
            }
        }

        self.selection.begin(
            &mut self.state,
            surface,
            &mut self.scheduler,
            point,
            zone,
            modifiers,
            double_click,
            now,
        );
        if !self.state.is_idle() {
            self.capture = Some(PointerButton::Primary);
        }
        Handled::Yes
    }

    pub fn pointer_moved(&mut self, surface: &mut Surface<'_>, point: Point, now: Instant) -> Handled {
        match self.state {
            GestureState::ExtendingCharacter
            | GestureState::ExtendingWord { .. }
            | GestureState::ExtendingLine { .. } => {
                self.selection.extend(&self.state, surface, point);
                Handled::Yes
            }
            GestureState::ApproachingDrag { .. } => {
                let started = self.with_drag(surface, now, |dd, cx| dd.track_approach(cx, point));
                if started.is_some() {
                    self.capture = None;
                    self.started_drag = started;
                }
                Handled::Yes
            }
            GestureState::ApproachingAutoScroll { .. }
            | GestureState::AutoScrollDragging(_)
            | GestureState::AutoScrollTimed(_) => {
                self.auto_scroll.track(&mut self.state, surface, &mut self.scheduler, point, now);
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    pub fn pointer_released(
        &mut self,
        surface: &mut Surface<'_>,
        point: Point,
        button: PointerButton,
        now: Instant,
    ) -> Handled {
        if self.capture != Some(button) {
            return Handled::No;
        }
        match button {
            PointerButton::Primary => {
                if self.state.is_extending() {
                    self.selection.extend(&self.state, surface, point);
                    self.selection.release(&mut self.state, surface, &mut self.scheduler);
                } else {
                    self.with_drag(surface, now, |dd, cx| dd.release_approach(cx, point));
                }
            }
            PointerButton::Middle => {
                self.auto_scroll.release(&mut self.state, surface, &mut self.scheduler, now);
            }
            PointerButton::Secondary | PointerButton::Extra1 | PointerButton::Extra2 => {}
        }
        if !self.is_auto_scroll_state() {
            self.capture = None;
        }
        Handled::Yes
    }

    /// Wheel rotation by `dx` columns and `dy` lines.
    pub fn wheel_rotated(&mut self, surface: &mut Surface<'_>, dx: i32, dy: i32) -> Handled {
        if self.is_auto_scroll_state() {
            self.auto_scroll.stop(&mut self.state, surface, &mut self.scheduler);
            self.capture = None;
            return Handled::Yes;
        }
        surface.scroll(dx, dy);
        if self.state.is_extending() {
            let last = self.selection_last_point();
            self.selection.extend(&self.state, surface, last);
        }
        Handled::Yes
    }

    pub fn key_pressed(&mut self, surface: &mut Surface<'_>, key: Key) -> Handled {
        match key {
            Key::Escape => {
                let active = !self.state.is_idle();
                self.cancel(surface);
                active.into()
            }
            Key::Other if self.is_auto_scroll_state() => {
                self.auto_scroll.stop(&mut self.state, surface, &mut self.scheduler);
                self.capture = None;
                Handled::Yes
            }
            Key::Other => Handled::No,
        }
    }

    pub fn focus_lost(&mut self, surface: &mut Surface<'_>) {
        self.cancel(surface);
    }

    pub fn capture_lost(&mut self, surface: &mut Surface<'_>) {
        self.cancel(surface);
    }

    /// Abandons any gesture without mutating the document. Idempotent.
    pub fn cancel(&mut self, surface: &mut Surface<'_>) {
        if self.state.is_idle() && self.capture.is_none() && self.scheduler.is_empty() {
            return;
        }
        tracing::debug!(state = self.state.label(), "gesture cancelled");
        self.reset(surface);
    }

    /// Fires every timer due at `now`.
    pub fn tick(&mut self, surface: &mut Surface<'_>, now: Instant) {
        for (handle, owner) in self.scheduler.due(now) {
            match owner {
                TimerOwner::SelectionObserver => {
                    self.selection
                        .on_timer(&self.state, surface, &mut self.scheduler, handle, now);
                }
                TimerOwner::DragScroll => {
                    self.with_drag(surface, now, |dd, cx| dd.on_timer(cx, handle));
                }
                TimerOwner::AutoScroll => {
                    self.auto_scroll
                        .on_timer(&mut self.state, surface, &mut self.scheduler, handle, now);
                }
            }
        }
    }

    /// Starts an outgoing drag of the selection, returning its payload.
    pub fn begin_drag(&mut self, surface: &mut Surface<'_>, point: Point, now: Instant) -> Option<DragData> {
        self.capture = None;
        self.started_drag = None;
        self.with_drag(surface, now, |dd, cx| dd.begin_drag(cx, point))
    }

    /// Payload of a drag that pointer movement just started, for the host's drag service.
    pub fn take_started_drag(&mut self) -> Option<DragData> {
        self.started_drag.take()
    }

    pub fn query_continue(&self, escape: bool, buttons: Buttons) -> DragAction {
        self.drag_drop.query_continue(escape, buttons)
    }

    pub fn end_drag(&mut self, surface: &mut Surface<'_>, effect: EffectMask, now: Instant) {
        self.with_drag(surface, now, |dd, cx| dd.end_drag(cx, effect));
    }

    pub fn drag_enter(
        &mut self,
        surface: &mut Surface<'_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
        now: Instant,
    ) -> EffectMask {
        self.with_drag(surface, now, |dd, cx| dd.drag_enter(cx, data, point, modifiers))
    }

    pub fn drag_over(
        &mut self,
        surface: &mut Surface<'_>,
        point: Point,
        modifiers: Modifiers,
        now: Instant,
    ) -> EffectMask {
        self.with_drag(surface, now, |dd, cx| dd.drag_over(cx, point, modifiers))
    }

    pub fn drag_leave(&mut self, surface: &mut Surface<'_>, now: Instant) {
        self.with_drag(surface, now, |dd, cx| dd.drag_leave(cx));
    }

    pub fn drop(
        &mut self,
        surface: &mut Surface<'_>,
        data: &DragData,
        point: Point,
        modifiers: Modifiers,
        now: Instant,
    ) -> EffectMask {
        self.with_drag(surface, now, |dd, cx| dd.drop(cx, data, point, modifiers))
    }

    pub fn cursor_shape(&self, surface: &Surface<'_>, point: Point) -> CursorShape {
        if let Some(indicator) = self.auto_scroll_indicator() {
            return indicator.cursor();
        }
        match self.state {
            GestureState::DraggingOut(_) | GestureState::DragTargetHover(_) => CursorShape::Arrow,
            GestureState::ApproachingDrag { .. } => CursorShape::Arrow,
            GestureState::ExtendingLine { .. } => CursorShape::LineSelect,
            GestureState::Idle => {
                let hits = HitTester::new(&*surface.layout, surface.text());
                let zone = hits.classify(point);
                if zone.is_ruler() {
                    CursorShape::LineSelect
                } else if zone == Zone::OutsideClient {
                    CursorShape::Arrow
                } else if hits.is_over_selection(point, &surface.document.selection()) {
                    CursorShape::Arrow
                } else {
                    CursorShape::IBeam
                }
            }
            _ => CursorShape::IBeam,
        }
    }

    /// Where the auto-scroll origin mark is drawn, while one is shown.
    pub fn auto_scroll_origin(&self) -> Option<Point> {
        AutoScrollController::origin(&self.state)
    }

    pub fn auto_scroll_indicator(&self) -> Option<ScrollIndicator> {
        AutoScrollController::indicator(&self.state)
    }

    fn is_auto_scroll_state(&self) -> bool {
        matches!(
            self.state,
            GestureState::ApproachingAutoScroll { .. }
                | GestureState::AutoScrollDragging(_)
                | GestureState::AutoScrollTimed(_)
        )
    }

    fn selection_last_point(&self) -> Point {
        self.selection.last_point()
    }

    fn reset(&mut self, surface: &mut Surface<'_>) {
        self.selection.cancel(&mut self.state, &mut self.scheduler);
        self.drag_drop.cancel(&mut self.state, &mut self.scheduler);
        self.auto_scroll.stop(&mut self.state, surface, &mut self.scheduler);
        self.state = GestureState::Idle;
        self.capture = None;
        self.started_drag = None;
        surface.layout.request_redraw();
    }

    fn with_drag<R>(
        &mut self,
        surface: &mut Surface<'_>,
        now: Instant,
        f: impl FnOnce(&mut DragDropCoordinator, &mut DragContext<'_, '_>) -> R,
    ) -> R {
        let mut cx = DragContext {
            state: &mut self.state,
            surface,
            scheduler: &mut self.scheduler,
            now,
        };
        f(&mut self.drag_drop, &mut cx)
    }
}
