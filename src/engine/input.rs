//! Raw input vocabulary shared by the host and the engine.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    /// First extra button, usually "back".
    Extra1,
    Extra2,
}

bitflags! {
    /// Keyboard modifiers held during a pointer or key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

bitflags! {
    /// Pointer buttons currently held, as reported to `query_continue`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const PRIMARY = 1 << 0;
        const SECONDARY = 1 << 1;
        const MIDDLE = 1 << 2;
        const EXTRA1 = 1 << 3;
        const EXTRA2 = 1 << 4;
    }
}

impl From<PointerButton> for Buttons {
    fn from(button: PointerButton) -> Self {
        match button {
            PointerButton::Primary => Buttons::PRIMARY,
            PointerButton::Secondary => Buttons::SECONDARY,
            PointerButton::Middle => Buttons::MIDDLE,
            PointerButton::Extra1 => Buttons::EXTRA1,
            PointerButton::Extra2 => Buttons::EXTRA2,
        }
    }
}

/// Keys the engine reacts to. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Whether the engine consumed an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Yes,
    No,
}

impl Handled {
    pub fn is_handled(self) -> bool {
        self == Handled::Yes
    }
}

impl From<bool> for Handled {
    fn from(handled: bool) -> Self {
        if handled { Handled::Yes } else { Handled::No }
    }
}

/// Pointer shape the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    IBeam,
    Arrow,
    /// Right-pointing arrow over the line-number column and gutter.
    LineSelect,
    AutoScrollNeutral,
    AutoScrollUp,
    AutoScrollDown,
}

/// Direction shown by the auto-scroll origin mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIndicator {
    Upward,
    Downward,
    Neutral,
}

impl ScrollIndicator {
    pub fn from_degree(degree: i32) -> Self {
        match degree.signum() {
            -1 => ScrollIndicator::Upward,
            1 => ScrollIndicator::Downward,
            _ => ScrollIndicator::Neutral,
        }
    }

    pub fn cursor(self) -> CursorShape {
        match self {
            ScrollIndicator::Upward => CursorShape::AutoScrollUp,
            ScrollIndicator::Downward => CursorShape::AutoScrollDown,
            ScrollIndicator::Neutral => CursorShape::AutoScrollNeutral,
        }
    }
}
