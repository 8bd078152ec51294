use std::cmp::Ordering;
use std::fmt;

/// A single insertion point in a document (0-indexed line, character column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Beginning of `line`.
    pub const fn bol(line: usize) -> Self {
        Self { line, column: 0 }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An ordered pair of positions. `beginning() <= end()` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    beginning: Position,
    end: Position,
}

impl Region {
    /// Builds a region from two positions in any order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self {
                beginning: a,
                end: b,
            }
        } else {
            Self {
                beginning: b,
                end: a,
            }
        }
    }

    pub fn collapsed(at: Position) -> Self {
        Self {
            beginning: at,
            end: at,
        }
    }

    pub fn beginning(&self) -> Position {
        self.beginning
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.beginning == self.end
    }

    /// Inclusive on both ends.
    pub fn includes(&self, p: Position) -> bool {
        self.beginning <= p && p <= self.end
    }

    /// Number of lines touched by the region.
    pub fn line_span(&self) -> usize {
        self.end.line - self.beginning.line + 1
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.beginning, self.end)
    }
}

/// Shape of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionShape {
    #[default]
    Linear,
    /// A column range across several lines (box selection).
    Rectangular,
}

/// Anchor, active end and shape of the caret's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
    pub shape: SelectionShape,
}

impl Selection {
    pub fn new(anchor: Position, active: Position, shape: SelectionShape) -> Self {
        Self {
            anchor,
            active,
            shape,
        }
    }

    /// A collapsed linear selection at `at`.
    pub fn caret(at: Position) -> Self {
        Self::new(at, at, SelectionShape::Linear)
    }

    pub fn region(&self) -> Region {
        Region::new(self.anchor, self.active)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub fn is_rectangular(&self) -> bool {
        self.shape == SelectionShape::Rectangular
    }

    /// Column range covered on each line of a rectangular selection.
    pub fn rectangle_columns(&self) -> std::ops::Range<usize> {
        let left = self.anchor.column.min(self.active.column);
        let right = self.anchor.column.max(self.active.column);
        left..right
    }

    /// Whether `p` (a character cell, not an insertion point) lies inside.
    pub fn covers(&self, p: Position) -> bool {
        if self.is_empty() {
            return false;
        }
        let region = self.region();
        match self.shape {
            SelectionShape::Linear => region.beginning() <= p && p < region.end(),
            SelectionShape::Rectangular => {
                (region.beginning().line..=region.end().line).contains(&p.line)
                    && self.rectangle_columns().contains(&p.column)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_order_by_line_then_column() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(4, 4).max(Position::new(4, 2)), Position::new(4, 4));
    }

    #[test]
    fn region_orders_its_ends() {
        let r = Region::new(Position::new(5, 1), Position::new(2, 7));
        assert_eq!(r.beginning(), Position::new(2, 7));
        assert_eq!(r.end(), Position::new(5, 1));
        assert_eq!(r.line_span(), 4);
    }

    #[test]
    fn linear_selection_covers_half_open_range() {
        let sel = Selection::new(
            Position::new(0, 2),
            Position::new(0, 5),
            SelectionShape::Linear,
        );
        assert!(sel.covers(Position::new(0, 2)));
        assert!(sel.covers(Position::new(0, 4)));
        assert!(!sel.covers(Position::new(0, 5)));
    }

    #[test]
    fn rectangular_selection_covers_column_band() {
        let sel = Selection::new(
            Position::new(1, 6),
            Position::new(3, 2),
            SelectionShape::Rectangular,
        );
        assert!(sel.covers(Position::new(2, 2)));
        assert!(sel.covers(Position::new(3, 5)));
        assert!(!sel.covers(Position::new(2, 6)));
        assert!(!sel.covers(Position::new(0, 3)));
    }
}
