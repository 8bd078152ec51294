use crate::model::geometry::{Point, ViewportGeometry};
use crate::model::position::Position;
use crate::surface::{Bias, Layout, TextSource};

/// Fixed-pitch layout: every character occupies one `char_width` x `line_pitch` cell.
///
/// A terminal host uses a 1x1 cell; a pixel host uses its font metrics.
#[derive(Debug, Clone)]
pub struct MonospaceLayout {
    geometry: ViewportGeometry,
    pub char_width: i32,
    pub line_pitch: i32,
    pub top_line: usize,
    pub left_column: usize,
    redraw_requested: bool,
}

impl MonospaceLayout {
    pub fn new(geometry: ViewportGeometry, char_width: i32, line_pitch: i32) -> Self {
        Self {
            geometry,
            char_width: char_width.max(1),
            line_pitch: line_pitch.max(1),
            top_line: 0,
            left_column: 0,
            redraw_requested: true,
        }
    }

    pub fn set_geometry(&mut self, geometry: ViewportGeometry) {
        self.geometry = geometry;
        self.redraw_requested = true;
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub fn visible_columns(&self) -> usize {
        (self.geometry.text_area().width() / self.char_width).max(0) as usize
    }

    /// Signed line offset of `y` from the first visible line.
    fn line_offset(&self, y: i32) -> i64 {
        let top = self.geometry.text_area().top;
        i64::from((y - top).div_euclid(self.line_pitch))
    }

    /// Horizontal distance of `x` from column zero of the document, in device units.
    /// Text flows left to right whichever side the ruler sits on.
    fn document_x(&self, x: i32) -> i64 {
        let area = self.geometry.text_area();
        let scrolled = self.left_column as i64 * i64::from(self.char_width);
        i64::from(x - area.left) + scrolled
    }

    fn line_at(&self, text: &dyn TextSource, y: i32) -> usize {
        let last = text.line_count().saturating_sub(1) as i64;
        (self.top_line as i64 + self.line_offset(y)).clamp(0, last) as usize
    }

    /// Scrolling stops once the last line reaches the top of the viewport.
    fn max_top_line(&self, text: &dyn TextSource) -> usize {
        text.line_count().saturating_sub(1)
    }
}

impl Layout for MonospaceLayout {
    fn geometry(&self) -> &ViewportGeometry {
        &self.geometry
    }

    fn position_for(&self, text: &dyn TextSource, point: Point, bias: Bias) -> Position {
        let line = self.line_at(text, point.y);
        let x = self.document_x(point.x).max(0);
        let width = i64::from(self.char_width);
        let mut column = x / width;
        let remainder = x - column * width;
        if remainder * 2 > width || (remainder * 2 == width && bias == Bias::Trailing) {
            column += 1;
        }
        let column = (column as usize).min(text.line_length(line));
        Position::new(line, column)
    }

    fn character_at(&self, text: &dyn TextSource, point: Point) -> Position {
        let line = self.line_at(text, point.y);
        let column = (self.document_x(point.x).max(0) / i64::from(self.char_width)) as usize;
        Position::new(line, column.min(text.line_length(line)))
    }

    fn point_for(&self, text: &dyn TextSource, position: Position) -> Point {
        let position = text.clamp(position);
        let area = self.geometry.text_area();
        let column = position.column as i64 - self.left_column as i64;
        let line = position.line as i64 - self.top_line as i64;
        Point::new(
            area.left + (column * i64::from(self.char_width)) as i32,
            area.top + (line * i64::from(self.line_pitch)) as i32,
        )
    }

    fn line_is_bidirectional(&self, text: &dyn TextSource, line: usize) -> bool {
        text.line_text(line).chars().any(is_strong_rtl)
    }

    fn scroll(&mut self, text: &dyn TextSource, dx: i32, dy: i32) {
        let top = (self.top_line as i64 + i64::from(dy)).clamp(0, self.max_top_line(text) as i64);
        let left = (self.left_column as i64 + i64::from(dx)).max(0);
        if top as usize != self.top_line || left as usize != self.left_column {
            self.top_line = top as usize;
            self.left_column = left as usize;
            self.redraw_requested = true;
            tracing::trace!(top_line = self.top_line, left_column = self.left_column, "scrolled");
        }
    }

    fn first_visible_line(&self) -> usize {
        self.top_line
    }

    fn visible_lines(&self) -> usize {
        (self.geometry.text_area().height() / self.line_pitch).max(0) as usize
    }

    fn line_pitch(&self) -> i32 {
        self.line_pitch
    }

    fn average_char_width(&self) -> i32 {
        self.char_width
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }
}

/// Characters with strong right-to-left direction (Hebrew, Arabic, Syriac,
/// Thaana, NKo and their presentation forms).
fn is_strong_rtl(c: char) -> bool {
    matches!(c,
        '\u{0590}'..='\u{08FF}'
        | '\u{FB1D}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
        | '\u{10800}'..='\u{10FFF}'
        | '\u{1E800}'..='\u{1EFFF}')
}
