use std::path::{Path, PathBuf};

use ropey::Rope;

use crate::error::EditError;
use crate::model::position::{Position, Region, Selection, SelectionShape};
use crate::surface::{Document, TextSource};

/// Snapshot pushed before each atomic edit.
#[derive(Debug, Clone)]
struct Revision {
    rope: Rope,
    selection: Selection,
}

/// A document backed by a Rope, with a caret selection and a snapshot undo stack.
///
/// Every mutating request is applied to a scratch copy first and committed
/// only on success, so a refused edit never leaves partial changes behind.
#[derive(Debug, Clone)]
pub struct RopeDocument {
    rope: Rope,
    pub path: Option<PathBuf>,
    selection: Selection,
    read_only: bool,
    narrowing: Option<Region>,
    history: Vec<Revision>,
}

impl Default for RopeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl RopeDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            path: None,
            selection: Selection::default(),
            read_only: false,
            narrowing: None,
            history: Vec::new(),
        }
    }

    /// Create a document from file contents.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut doc = Self::from_text(&text);
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Restricts edits to `region`. `None` makes the whole document editable.
    pub fn narrow_to(&mut self, region: Option<Region>) {
        self.narrowing = region;
    }

    /// Number of committed edits that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Reverts the last committed edit. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(revision) => {
                self.rope = revision.rope;
                self.selection = revision.selection;
                true
            }
            None => false,
        }
    }

    fn check_writable(&self, region: Region) -> Result<(), EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        let accessible = self.accessible_region();
        for p in [region.beginning(), region.end()] {
            if !accessible.includes(p) {
                return Err(EditError::Inaccessible(p));
            }
        }
        Ok(())
    }

    /// Cells a rectangular insert of `text` at `at` writes to. Rows past the
    /// last line are appended at the end of the document.
    fn rectangle_extent(&self, at: Position, text: &str) -> Region {
        let last_line = at.line + rectangle_rows(text).len().saturating_sub(1);
        let last = if last_line < self.line_count() {
            Position::new(last_line, at.column)
        } else {
            self.end_position()
        };
        Region::new(at, last)
    }

    fn commit(&mut self, rope: Rope, selection: Selection) {
        let previous = Revision {
            rope: std::mem::replace(&mut self.rope, rope),
            selection: self.selection,
        };
        self.history.push(previous);
        self.selection = selection;
    }
}

impl TextSource for RopeDocument {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_length(&self, line: usize) -> usize {
        line_length(&self.rope, line)
    }

    fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let len = self.line_length(line);
        self.rope.line(line).slice(..len).to_string()
    }
}

impl Document for RopeDocument {
    fn selection(&self) -> Selection {
        self.selection
    }

    fn select(&mut self, anchor: Position, active: Position, shape: SelectionShape) {
        self.selection = Selection::new(self.clamp(anchor), self.clamp(active), shape);
    }

    fn replace_selection(&mut self, text: &str, rectangular: bool) -> Result<Region, EditError> {
        let selection = self.selection;
        self.check_writable(selection.region())?;
        let boxed = selection.is_rectangular() && !selection.is_empty();
        let at = if boxed {
            Position::new(selection.region().beginning().line, selection.rectangle_columns().start)
        } else {
            selection.region().beginning()
        };
        if rectangular {
            self.check_writable(self.rectangle_extent(at, text))?;
        }

        let mut rope = self.rope.clone();
        if boxed {
            remove_rectangle(&mut rope, &selection);
        } else {
            let region = selection.region();
            let begin = char_index(&rope, region.beginning())?;
            let end = char_index(&rope, region.end())?;
            rope.remove(begin..end);
        }

        let (inserted, caret) = if rectangular {
            insert_rectangle(&mut rope, at, text)
        } else {
            let start = char_index(&rope, at)?;
            rope.insert(start, text);
            let end = char_position(&rope, start + text.chars().count());
            let region = Region::new(at, end);
            (region, Selection::caret(end))
        };

        self.commit(rope, caret);
        tracing::trace!("replaced selection, inserted {inserted}");
        Ok(inserted)
    }

    fn move_selection_to(&mut self, destination: Position) -> Result<Region, EditError> {
        let selection = self.selection;
        if selection.is_empty() {
            return Ok(Region::collapsed(destination));
        }
        self.check_writable(selection.region())?;
        self.check_writable(Region::collapsed(destination))?;
        if selection.covers(destination) && destination != selection.region().beginning() {
            return Err(EditError::OverlappingMove);
        }

        let mut rope = self.rope.clone();
        if selection.is_rectangular() {
            let pieces = rectangle_pieces(&rope, &selection);
            let columns = selection.rectangle_columns();
            let region = selection.region();
            let mut target = destination;
            if (region.beginning().line..=region.end().line).contains(&target.line)
                && target.column >= columns.end
            {
                let len = line_length(&rope, target.line);
                target.column -= columns.end.min(len) - columns.start.min(len);
            }
            let text = pieces.join("\n");
            self.check_writable(self.rectangle_extent(target, &text))?;
            remove_rectangle(&mut rope, &selection);
            let (inserted, _) = insert_rectangle(&mut rope, target, &text);
            let moved = Selection::new(inserted.beginning(), inserted.end(), SelectionShape::Rectangular);
            self.commit(rope, moved);
            return Ok(inserted);
        }

        let region = selection.region();
        let begin = char_index(&rope, region.beginning())?;
        let end = char_index(&rope, region.end())?;
        let dest = char_index(&rope, destination)?;
        let text = rope.slice(begin..end).to_string();
        let len = end - begin;
        let start = if dest >= end {
            rope.remove(begin..end);
            let start = dest - len;
            rope.insert(start, &text);
            start
        } else {
            rope.insert(dest, &text);
            rope.remove(begin + len..end + len);
            dest
        };
        let landed = Region::new(char_position(&rope, start), char_position(&rope, start + len));
        self.commit(rope, Selection::new(landed.beginning(), landed.end(), SelectionShape::Linear));
        Ok(landed)
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn can_paste(&self) -> bool {
        !self.read_only
    }

    fn accessible_region(&self) -> Region {
        self.narrowing
            .unwrap_or_else(|| Region::new(Position::default(), self.end_position()))
    }

    fn selected_text(&self) -> String {
        let selection = self.selection;
        if selection.is_rectangular() {
            return rectangle_pieces(&self.rope, &selection).join("\n");
        }
        let region = selection.region();
        match (
            char_index(&self.rope, region.beginning()),
            char_index(&self.rope, region.end()),
        ) {
            (Ok(begin), Ok(end)) => self.rope.slice(begin..end).to_string(),
            _ => String::new(),
        }
    }
}

fn line_length(rope: &Rope, line: usize) -> usize {
    if line >= rope.len_lines() {
        return 0;
    }
    let slice = rope.line(line);
    let mut len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}

fn char_index(rope: &Rope, p: Position) -> Result<usize, EditError> {
    if p.line >= rope.len_lines() || p.column > line_length(rope, p.line) {
        return Err(EditError::InvalidPosition(p));
    }
    Ok(rope.line_to_char(p.line) + p.column)
}

fn char_position(rope: &Rope, index: usize) -> Position {
    let index = index.min(rope.len_chars());
    let line = rope.char_to_line(index);
    Position::new(line, index - rope.line_to_char(line))
}

/// Per-line text covered by a rectangular selection, clipped to each line.
fn rectangle_pieces(rope: &Rope, selection: &Selection) -> Vec<String> {
    let region = selection.region();
    let columns = selection.rectangle_columns();
    (region.beginning().line..=region.end().line)
        .map(|line| {
            let len = line_length(rope, line);
            let (from, to) = (columns.start.min(len), columns.end.min(len));
            let base = rope.line_to_char(line);
            rope.slice(base + from..base + to).to_string()
        })
        .collect()
}

fn remove_rectangle(rope: &mut Rope, selection: &Selection) {
    let region = selection.region();
    let columns = selection.rectangle_columns();
    for line in (region.beginning().line..=region.end().line).rev() {
        let len = line_length(rope, line);
        let (from, to) = (columns.start.min(len), columns.end.min(len));
        let base = rope.line_to_char(line);
        rope.remove(base + from..base + to);
    }
}

/// Rows of rectangular `text`. A single trailing line break does not add a row.
fn rectangle_rows(text: &str) -> Vec<&str> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|piece| piece.strip_suffix('\r').unwrap_or(piece))
        .collect()
}

/// Inserts each line of `text` at `at.column` on successive lines, padding short
/// lines with spaces and appending lines past the end of the document.
fn insert_rectangle(rope: &mut Rope, at: Position, text: &str) -> (Region, Selection) {
    let pieces = rectangle_rows(text);
    let mut widest = 0;
    let mut last_width = 0;
    for (offset, piece) in pieces.iter().enumerate() {
        let line = at.line + offset;
        while line >= rope.len_lines() {
            let end = rope.len_chars();
            rope.insert_char(end, '\n');
        }
        let len = line_length(rope, line);
        let base = rope.line_to_char(line);
        if len < at.column {
            rope.insert(base + len, &" ".repeat(at.column - len));
        }
        rope.insert(base + at.column, piece);
        last_width = piece.chars().count();
        widest = widest.max(last_width);
    }
    let last_line = at.line + pieces.len().saturating_sub(1);
    let region = Region::new(at, Position::new(last_line, at.column + widest));
    let caret = Selection::caret(Position::new(last_line, at.column + last_width));
    (region, caret)
}
