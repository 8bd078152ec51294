//! Middle-button auto-scroll.
//!
//! A middle press marks an origin. Dragging past the threshold scrolls while
//! the button is held; releasing without moving leaves auto-scroll running
//! until the next middle press. The scroll rate doubles every two lines of
//! distance from the origin.

use std::time::{Duration, Instant};

use crate::engine::input::ScrollIndicator;
use crate::engine::scheduler::{Scheduler, TimerHandle, TimerOwner};
use crate::model::config::{AutoScrollConfig, EngineConfig};
use crate::model::geometry::Point;
use crate::model::gesture::{AutoScrollTelemetry, GestureState};
use crate::surface::Surface;

#[derive(Debug)]
pub struct AutoScrollController {
    intervals: AutoScrollConfig,
    threshold: i32,
    timer: Option<TimerHandle>,
}

impl AutoScrollController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            intervals: config.auto_scroll.clone(),
            threshold: config.drag_threshold(),
            timer: None,
        }
    }

    /// Delay before the next tick at `degree` lines from the origin.
    pub fn interval(&self, degree: i32) -> Duration {
        let min = self.intervals.min_interval_ms;
        if degree == 0 {
            return Duration::from_millis(self.intervals.neutral_interval_ms.max(min));
        }
        let halvings = degree.unsigned_abs() / 2;
        let ms = 1u64
            .checked_shl(halvings)
            .map_or(0, |divisor| self.intervals.base_interval_ms / divisor);
        Duration::from_millis(ms.max(min))
    }

    /// Middle press while idle. Only documents taller than the viewport auto-scroll.
    pub fn approach(&mut self, state: &mut GestureState, surface: &Surface<'_>, origin: Point) -> bool {
        if !state.is_idle() || surface.document.line_count() <= surface.layout.visible_lines() {
            return false;
        }
        tracing::debug!(?origin, "approaching auto-scroll");
        *state = GestureState::ApproachingAutoScroll { origin };
        true
    }

    pub fn track(
        &mut self,
        state: &mut GestureState,
        surface: &mut Surface<'_>,
        scheduler: &mut Scheduler,
        point: Point,
        now: Instant,
    ) {
        let pitch = surface.layout.line_pitch();
        match state {
            GestureState::ApproachingAutoScroll { origin } => {
                if origin.exceeds(point, self.threshold) {
                    let mut telemetry = AutoScrollTelemetry::new(*origin);
                    telemetry.track(point, pitch);
                    *state = GestureState::AutoScrollDragging(telemetry);
                    self.activate(surface, scheduler, now);
                }
            }
            GestureState::AutoScrollDragging(telemetry) | GestureState::AutoScrollTimed(telemetry) => {
                let before = telemetry.degree.signum();
                telemetry.track(point, pitch);
                if telemetry.degree.signum() != before {
                    surface.layout.request_redraw();
                }
            }
            _ => {}
        }
    }

    /// Middle button released.
    pub fn release(
        &mut self,
        state: &mut GestureState,
        surface: &mut Surface<'_>,
        scheduler: &mut Scheduler,
        now: Instant,
    ) {
        match *state {
            GestureState::ApproachingAutoScroll { origin } => {
                *state = GestureState::AutoScrollTimed(AutoScrollTelemetry::new(origin));
                self.activate(surface, scheduler, now);
            }
            GestureState::AutoScrollDragging(_) => self.stop(state, surface, scheduler),
            _ => {}
        }
    }

    /// Ends auto-scroll from any state; a no-op when not auto-scrolling.
    pub fn stop(&mut self, state: &mut GestureState, surface: &mut Surface<'_>, scheduler: &mut Scheduler) {
        scheduler.cancel_slot(&mut self.timer);
        if matches!(
            state,
            GestureState::ApproachingAutoScroll { .. }
                | GestureState::AutoScrollDragging(_)
                | GestureState::AutoScrollTimed(_)
        ) {
            tracing::debug!("auto-scroll stopped");
            *state = GestureState::Idle;
            surface.layout.request_redraw();
        }
    }

    pub fn on_timer(
        &mut self,
        state: &mut GestureState,
        surface: &mut Surface<'_>,
        scheduler: &mut Scheduler,
        handle: TimerHandle,
        now: Instant,
    ) {
        if self.timer != Some(handle) {
            return;
        }
        self.timer = None;
        let Some(telemetry) = state.telemetry() else {
            return;
        };
        let degree = telemetry.degree;
        if degree != 0 {
            surface.scroll(0, degree.signum());
        }
        self.timer = Some(scheduler.schedule(TimerOwner::AutoScroll, self.interval(degree), now));
    }

    pub fn indicator(state: &GestureState) -> Option<ScrollIndicator> {
        match state {
            GestureState::ApproachingAutoScroll { .. } => Some(ScrollIndicator::Neutral),
            _ => state.telemetry().map(|t| ScrollIndicator::from_degree(t.degree)),
        }
    }

    pub fn origin(state: &GestureState) -> Option<Point> {
        match state {
            GestureState::ApproachingAutoScroll { origin } => Some(*origin),
            _ => state.telemetry().map(|t| t.origin),
        }
    }

    fn activate(&mut self, surface: &mut Surface<'_>, scheduler: &mut Scheduler, now: Instant) {
        tracing::debug!("auto-scroll active");
        scheduler.cancel_slot(&mut self.timer);
        self.timer = Some(scheduler.schedule(TimerOwner::AutoScroll, Duration::ZERO, now));
        surface.layout.request_redraw();
    }
}
