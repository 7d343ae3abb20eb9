//! Source positions
//!
//! Positions are plain values ordered by byte offset. They never point into
//! a token buffer, so they survive AST rewrites (list sorting, glob
//! expansion) and double as comment anchors.

use serde::Serialize;
use std::fmt;

/// A point in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Pos {
    /// Byte offset from the start of the file
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Pos {
    /// Marker for synthesized nodes that have no source location
    pub const NONE: Pos = Pos {
        offset: 0,
        line: 0,
        column: 0,
    };

    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Carry this position along when the text starting at `from` moves to
    /// `to`. Columns only shift on the starting line.
    pub fn relocate(self, from: Pos, to: Pos) -> Self {
        if self.is_none() || from.is_none() || to.is_none() {
            return Self::NONE;
        }
        Self {
            offset: self.offset.saturating_sub(from.offset) + to.offset,
            line: self.line.saturating_sub(from.line) + to.line,
            column: if self.line == from.line {
                self.column.saturating_sub(from.column) + to.column
            } else {
                self.column
            },
        }
    }

    /// The position `width` bytes further along the same line
    pub fn advance(self, width: usize) -> Self {
        Self {
            offset: self.offset + width,
            line: self.line,
            column: self.column + width,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "-")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
