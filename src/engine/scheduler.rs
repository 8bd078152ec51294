//! One-shot timers driven by an injected clock.
//!
//! The host calls [`Scheduler::due`] (through the dispatcher's `tick`) with the
//! current instant; nothing here reads a clock or spawns a thread.

use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Opaque handle to a scheduled timer. Stale handles are harmless.
    pub struct TimerHandle;
}

/// The controller a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    SelectionObserver,
    DragScroll,
    AutoScroll,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline: Instant,
    owner: TimerOwner,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: SlotMap<TimerHandle, Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: TimerOwner, delay: Duration, now: Instant) -> TimerHandle {
        self.timers.insert(Entry {
            deadline: now + delay,
            owner,
        })
    }

    /// Cancels `handle` if it is still pending.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.timers.remove(handle);
    }

    /// Cancels the timer in `slot`, if any, and clears the slot.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(handle)
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<Instant> {
        self.timers.get(handle).map(|e| e.deadline)
    }

    /// The earliest pending deadline, for hosts that sleep until the next timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|e| e.deadline).min()
    }

    /// Removes and returns every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<(TimerHandle, TimerOwner)> {
        let mut fired: Vec<(TimerHandle, Entry)> = self
            .timers
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(h, e)| (h, *e))
            .collect();
        fired.sort_by_key(|(_, e)| e.deadline);
        for (handle, _) in &fired {
            self.timers.remove(*handle);
        }
        fired.into_iter().map(|(h, e)| (h, e.owner)).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
