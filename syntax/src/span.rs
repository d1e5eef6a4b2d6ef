//! Source location and span tracking.
//!
//! Tree nodes carry the [`Span`] the front end recorded for them so that
//! code generation failures can point back at the source. Spans are
//! optional in serialized input and default to an unknown location.

use serde::{Deserialize, Serialize};

/// A single position in source text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Pos {
    /// Line number (1-based, 0 when unknown).
    pub line: usize,
    /// Column number (1-based, 0 when unknown).
    pub column: usize,
}

impl Pos {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous region of source text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Whether the front end supplied a real location.
    pub fn is_known(&self) -> bool {
        self.start.line != 0
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
