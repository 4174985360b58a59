//! Sliding character window over a [`CharSource`].
//!
//! The window owns a growable buffer with a trailing NUL sentinel so the
//! scan loops can dispatch on a single character read. Line and column
//! are derived from the cursor and a per-line anchor rather than stored,
//! and both survive relocation of the unread tail.

use tracing::trace;

use crate::source::{CharSource, SourceError};

/// Placeholder character stored past the buffered region.
pub(crate) const SENTINEL: char = '\0';

const MIN_CAPACITY: usize = 2048;
const SHIFT_DIVISOR: usize = 16;
const MAX_CAPACITY: usize = isize::MAX as usize / std::mem::size_of::<char>();

/// Growable lookahead buffer with derived source positions.
///
/// The anchor of the current line is signed: relocating the unread tail
/// to the front of the buffer moves it by the same delta as the cursor,
/// which may carry it below zero when the line began before the tail.
pub(crate) struct CharWindow<S> {
    source: S,
    buf: Vec<char>,
    cursor: usize,
    buffered: usize,
    line_anchor: isize,
    line_index: usize,
    exhausted: bool,
}

impl<S: CharSource> CharWindow<S> {
    /// Creates a window over the given source.
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            buf: vec![SENTINEL; MIN_CAPACITY],
            cursor: 0,
            buffered: 0,
            line_anchor: 0,
            line_index: 0,
            exhausted: false,
        }
    }

    /// Returns the character at the cursor, or the sentinel past the
    /// buffered region.
    pub(crate) fn current(&self) -> char {
        self.buf[self.cursor]
    }

    /// Returns `true` while buffered characters remain ahead of the
    /// cursor. Distinguishes a literal NUL from the sentinel.
    pub(crate) fn pending(&self) -> bool {
        self.cursor < self.buffered
    }

    /// Returns the character `offset` positions past the cursor.
    ///
    /// Valid only after [`CharWindow::has_lookahead`] confirmed the
    /// offset.
    pub(crate) fn peek(&self, offset: usize) -> char {
        self.buf[self.cursor + offset]
    }

    /// Ensures `offset` characters past the cursor are buffered,
    /// refilling (and growing) as required. Returns `false` when the
    /// stream ends first.
    pub(crate) fn has_lookahead(&mut self, offset: usize) -> Result<bool, SourceError> {
        let needed = self.cursor.saturating_add(offset);
        while needed >= self.buffered {
            if self.exhausted {
                return Ok(false);
            }
            self.refill()?;
        }
        Ok(true)
    }

    /// Returns `true` when the character after the cursor is a line feed.
    pub(crate) fn next_is_line_feed(&mut self) -> Result<bool, SourceError> {
        Ok(self.has_lookahead(1)? && self.peek(1) == '\n')
    }

    /// Returns `true` when no further characters can be obtained.
    ///
    /// Called when the sentinel has been observed at the cursor; attempts
    /// one more refill before giving up.
    pub(crate) fn is_eof(&mut self) -> Result<bool, SourceError> {
        while self.cursor >= self.buffered {
            if self.exhausted {
                return Ok(true);
            }
            self.refill()?;
        }
        Ok(false)
    }

    /// Advances the cursor over one non-terminator character.
    pub(crate) fn bump(&mut self) {
        debug_assert!(self.pending());
        self.cursor += 1;
    }

    /// Consumes the line terminator at the cursor (`\n` or `\r\n`),
    /// advancing the line count and resetting the line anchor.
    pub(crate) fn consume_line_break(&mut self) {
        if self.buf[self.cursor] == '\r' {
            self.cursor += 1;
        }
        debug_assert_eq!(self.buf[self.cursor], '\n');
        self.cursor += 1;
        self.line_index += 1;
        self.line_anchor = self.cursor as isize;
    }

    /// Returns the cursor offset into the buffer.
    pub(crate) fn offset(&self) -> usize {
        self.cursor
    }

    /// Returns the 1-based line of the cursor.
    pub(crate) fn line(&self) -> usize {
        self.line_index + 1
    }

    /// Returns the 1-based column of the cursor within its line.
    pub(crate) fn column(&self) -> usize {
        (self.cursor as isize - self.line_anchor + 1) as usize
    }

    /// Returns the buffered characters from `from` up to the cursor.
    pub(crate) fn lexeme(&self, from: usize) -> &[char] {
        &self.buf[from..self.cursor]
    }

    /// Copies the characters from `from` up to the cursor into an owned
    /// string.
    pub(crate) fn take_from(&self, from: usize) -> String {
        self.buf[from..self.cursor].iter().collect()
    }

    /// Relocates the unread tail to the front when little room remains
    /// behind the cursor. Runs only between tokens, so no anchor into the
    /// consumed region can be invalidated.
    pub(crate) fn shift_if_crowded(&mut self) {
        let capacity = self.buf.len();
        if capacity - self.cursor > capacity / SHIFT_DIVISOR {
            return;
        }
        let delta = self.cursor;
        self.buf.copy_within(delta..self.buffered, 0);
        self.cursor = 0;
        self.buffered -= delta;
        self.line_anchor -= delta as isize;
        self.buf[self.buffered] = SENTINEL;
        trace!(delta, buffered = self.buffered, "window shifted");
    }

    /// Requests characters from the source until the buffer is full (to
    /// one less than capacity, preserving the sentinel slot) or the
    /// source reports empty twice in succession.
    fn refill(&mut self) -> Result<(), SourceError> {
        if self.buffered + 1 >= self.buf.len() {
            self.grow();
            if self.buffered + 1 >= self.buf.len() {
                // Capacity is at its ceiling; nothing more can be held.
                self.exhausted = true;
                return Ok(());
            }
        }
        let limit = self.buf.len() - 1;
        let mut empty_reads = 0u8;
        while self.buffered < limit && empty_reads < 2 {
            let read = self.source.read_chars(&mut self.buf[self.buffered..limit])?;
            if read == 0 {
                empty_reads += 1;
            } else {
                empty_reads = 0;
                self.buffered += read;
            }
        }
        if empty_reads == 2 {
            self.exhausted = true;
        }
        self.buf[self.buffered] = SENTINEL;
        trace!(buffered = self.buffered, exhausted = self.exhausted, "window refilled");
        Ok(())
    }

    /// Doubles the buffer, capped at the largest representable
    /// allocation. A no-op once the cap is reached.
    fn grow(&mut self) {
        let capacity = self.buf.len();
        let next = capacity.saturating_mul(2).min(MAX_CAPACITY);
        if next == capacity {
            return;
        }
        self.buf.resize(next, SENTINEL);
        trace!(capacity = next, "window grown");
    }
}
