use serde::{Deserialize, Serialize};

/// A viewport-local point. One unit is one device pixel (or one terminal cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether `other` lies outside the square box of half-size `threshold` around `self`.
    pub fn exceeds(&self, other: Point, threshold: i32) -> bool {
        (other.x - self.x).abs() > threshold || (other.y - self.y).abs() > threshold
    }
}

/// Axis-aligned rectangle, half open: `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }
}

/// Side of the viewport the vertical ruler (gutter + line numbers) sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulerAlignment {
    #[default]
    Left,
    Right,
}

/// Static partition of the viewport's client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportGeometry {
    pub bounds: Rect,
    /// Width of the indicator gutter at the outer edge of the ruler.
    pub gutter_width: i32,
    pub line_numbers_width: i32,
    /// Blank space between the ruler and the first text column.
    pub text_padding: i32,
    pub top_margin: i32,
    pub bottom_margin: i32,
    pub ruler_alignment: RulerAlignment,
}

impl ViewportGeometry {
    pub fn ruler_width(&self) -> i32 {
        self.gutter_width + self.line_numbers_width
    }

    /// The region where text glyphs are laid out.
    pub fn text_area(&self) -> Rect {
        let inset = self.ruler_width() + self.text_padding;
        let (left, right) = match self.ruler_alignment {
            RulerAlignment::Left => (self.bounds.left + inset, self.bounds.right),
            RulerAlignment::Right => (self.bounds.left, self.bounds.right - inset),
        };
        Rect {
            left,
            top: self.bounds.top + self.top_margin,
            right: right.max(left),
            bottom: (self.bounds.bottom - self.bottom_margin).max(self.bounds.top + self.top_margin),
        }
    }
}
