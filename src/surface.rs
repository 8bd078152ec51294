//! Collaborator seams.
//!
//! The engine never owns text, layout or word-break rules. It reaches them
//! through these traits, bundled per call into a [`Surface`].

use std::ops::Range;

use crate::error::EditError;
use crate::model::geometry::{Point, ViewportGeometry};
use crate::model::position::{Position, Region, Selection, SelectionShape};

/// Read-only access to document text. Columns count characters.
pub trait TextSource {
    fn line_count(&self) -> usize;

    /// Length of `line` without its line terminator. Zero for missing lines.
    fn line_length(&self, line: usize) -> usize;

    /// Text of `line` without its line terminator.
    fn line_text(&self, line: usize) -> String;

    /// Clamps `p` to an existing position.
    fn clamp(&self, p: Position) -> Position {
        let last = self.line_count().saturating_sub(1);
        let line = p.line.min(last);
        Position::new(line, p.column.min(self.line_length(line)))
    }

    /// Position just past the last character of the document.
    fn end_position(&self) -> Position {
        let last = self.line_count().saturating_sub(1);
        Position::new(last, self.line_length(last))
    }
}

/// The document/caret collaborator. Every mutation is a single atomic request.
pub trait Document: TextSource {
    fn selection(&self) -> Selection;

    fn select(&mut self, anchor: Position, active: Position, shape: SelectionShape);

    /// Replaces the selection with `text` and returns the inserted range.
    ///
    /// With `rectangular`, each line of `text` is inserted at the selection's
    /// column on successive lines.
    fn replace_selection(&mut self, text: &str, rectangular: bool) -> Result<Region, EditError>;

    /// Moves the selected text to `destination` as one edit (one undo unit)
    /// and returns where the text landed.
    fn move_selection_to(&mut self, destination: Position) -> Result<Region, EditError>;

    fn is_read_only(&self) -> bool;

    fn can_paste(&self) -> bool;

    /// The part of the document that accepts edits.
    fn accessible_region(&self) -> Region;

    fn selected_region(&self) -> Region {
        self.selection().region()
    }

    fn selected_text(&self) -> String;
}

/// The layout/rendering collaborator.
pub trait Layout {
    fn geometry(&self) -> &ViewportGeometry;

    /// Nearest insertion position for `point`. Out-of-range points clamp.
    fn position_for(&self, text: &dyn TextSource, point: Point, bias: Bias) -> Position;

    /// Character cell under `point`, clamped.
    fn character_at(&self, text: &dyn TextSource, point: Point) -> Position;

    /// Top-left corner of the cell at `position`.
    fn point_for(&self, text: &dyn TextSource, position: Position) -> Point;

    fn line_is_bidirectional(&self, text: &dyn TextSource, line: usize) -> bool;

    /// Scrolls by `dx` columns and `dy` lines.
    fn scroll(&mut self, text: &dyn TextSource, dx: i32, dy: i32);

    fn first_visible_line(&self) -> usize;

    fn visible_lines(&self) -> usize;

    fn line_pitch(&self) -> i32;

    fn average_char_width(&self) -> i32;

    /// Asks the renderer to repaint the viewport.
    fn request_redraw(&mut self);
}

/// Word segmentation used by word-wise selection.
pub trait WordBreaker {
    /// Column range of the segment around `p` on its line.
    fn word_at(&self, text: &dyn TextSource, p: Position) -> Range<usize>;

    /// Start of the segment containing `p`, never leaving `p`'s line.
    fn word_start(&self, text: &dyn TextSource, p: Position) -> Position {
        Position::new(p.line, self.word_at(text, p).start)
    }

    /// End of the segment containing `p`, never leaving `p`'s line.
    fn word_end(&self, text: &dyn TextSource, p: Position) -> Position {
        Position::new(p.line, self.word_at(text, p).end)
    }
}

/// Tie-breaking rule when a point falls exactly between two insertion positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    #[default]
    Leading,
    Trailing,
}

/// Borrowed collaborators for the duration of one callback.
pub struct Surface<'a> {
    pub document: &'a mut dyn Document,
    pub layout: &'a mut dyn Layout,
    pub words: &'a dyn WordBreaker,
}

impl<'a> Surface<'a> {
    pub fn new(
        document: &'a mut dyn Document,
        layout: &'a mut dyn Layout,
        words: &'a dyn WordBreaker,
    ) -> Self {
        Self {
            document,
            layout,
            words,
        }
    }

    pub fn text(&self) -> &dyn TextSource {
        &*self.document
    }

    /// Scrolls the layout, handing it the document for clamping.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        let text: &dyn TextSource = &*self.document;
        self.layout.scroll(text, dx, dy);
    }
}
