use std::ops::Range;

use crate::model::position::Position;
use crate::surface::{TextSource, WordBreaker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Punctuation,
}

fn classify(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punctuation
    }
}

/// Splits lines into runs of identifier characters, whitespace and punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierWords;

impl WordBreaker for IdentifierWords {
    fn word_at(&self, text: &dyn TextSource, p: Position) -> Range<usize> {
        let chars: Vec<char> = text.line_text(p.line).chars().collect();
        if chars.is_empty() {
            return 0..0;
        }
        // At end of line the segment is the one before the caret.
        let at = p.column.min(chars.len() - 1);
        let class = classify(chars[at]);

        let start = chars[..at]
            .iter()
            .rposition(|&c| classify(c) != class)
            .map_or(0, |i| i + 1);
        let end = chars[at..]
            .iter()
            .position(|&c| classify(c) != class)
            .map_or(chars.len(), |i| at + i);
        start..end
    }
}
