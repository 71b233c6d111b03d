//! Source position tracking

use serde::Serialize;

/// Source position
///
/// `line`/`column` are 1-based and count Unicode scalar values, for error
/// display; `byte_offset` is 0-based into the UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    /// Create new position
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    /// Start of file
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }

    /// Position of `byte_offset` in `source`
    ///
    /// An offset past the end, or inside a character, stops at the last
    /// character boundary before it.
    pub fn at_offset(source: &str, byte_offset: usize) -> Self {
        let mut pos = Self::start();
        for c in source.chars() {
            if pos.byte_offset + c.len_utf8() > byte_offset {
                break;
            }
            pos.advance(c);
        }
        pos
    }

    /// Advance past one character
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.byte_offset += c.len_utf8();
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
