//! Text cursor for navigating the input with position tracking

use crate::error::{Pos, CONTEXT_LEN};

/// Cursor over the input text
///
/// The cursor only ever stops on offsets returned by `str::find` or after
/// consuming ASCII markup, so it always rests on a char boundary.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    /// Create cursor at the start of the input
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Get current byte without consuming
    pub fn current(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Check whether the remaining input starts with `pattern`
    pub fn starts_with(&self, pattern: &str) -> bool {
        self.remaining().starts_with(pattern)
    }

    /// Absolute offset of the next occurrence of `pattern`
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.remaining().find(pattern).map(|idx| self.pos + idx)
    }

    /// Move forward to an absolute offset, keeping line and column in sync
    pub fn advance_to(&mut self, target: usize) {
        let target = target.min(self.input.len());
        if target <= self.pos {
            return;
        }
        let skipped = self.input.get(self.pos..target).unwrap_or_default();
        for ch in skipped.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos = target;
    }

    /// Move forward by `n` bytes
    pub fn advance_by(&mut self, n: usize) {
        self.advance_to(self.pos.saturating_add(n));
    }

    /// Get current position
    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    /// Get current position index
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Get remaining text
    pub fn remaining(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// Get text between two absolute offsets
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.input.get(start..end).unwrap_or_default()
    }

    /// Short excerpt of the remaining text, for diagnostics
    pub fn context(&self) -> String {
        self.context_at(self.pos)
    }

    /// Short excerpt of the text starting at an absolute offset
    pub fn context_at(&self, offset: usize) -> String {
        self.input
            .get(offset..)
            .unwrap_or_default()
            .chars()
            .take(CONTEXT_LEN)
            .collect()
    }
}
