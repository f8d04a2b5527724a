// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconstruction of the line the user is editing at the prompt.
//!
//! The model is only ever driven by matched output from the shell. Positions
//! are byte offsets into `text`. A CR byte stored in `text` marks the point
//! where the visible line wrapped onto the next terminal row; cursor motion
//! and erasure stay within the row delimited by those markers.

/// Backing storage grows in multiples of this many bytes.
pub const GROW_STEP: usize = 256;

/// Wrap marker stored inside the text.
pub const WRAP: u8 = b'\r';

#[derive(Debug, Default, Clone)]
pub struct CommandLine {
    text: Vec<u8>,
    cursor: usize,
    rebuilding: bool,
}

impl CommandLine {
    pub fn new() -> Self {
        Self { text: Vec::with_capacity(GROW_STEP), cursor: 0, rebuilding: false }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding
    }

    /// Raw contents, wrap markers included.
    pub fn raw(&self) -> &[u8] {
        &self.text
    }

    /// The command as the user sees it, wrap markers removed.
    pub fn text(&self) -> String {
        let bytes: Vec<u8> = self.text.iter().copied().filter(|b| *b != WRAP).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.rebuilding = false;
    }

    /// The next written content replaces the whole line.
    pub fn rebuild(&mut self) {
        self.rebuilding = true;
    }

    fn reserve(&mut self, extra: usize) {
        let needed = self.text.len() + extra;
        if needed > self.text.capacity() {
            let target = needed.div_ceil(GROW_STEP) * GROW_STEP;
            self.text.reserve_exact(target - self.text.len());
        }
    }

    /// Start of the wrapped row holding the cursor.
    fn row_start(&self) -> usize {
        self.text[..self.cursor].iter().rposition(|b| *b == WRAP).map_or(0, |i| i + 1)
    }

    /// End of the wrapped row holding the cursor (the next marker or the end).
    fn row_end(&self) -> usize {
        self.text[self.cursor..].iter().position(|b| *b == WRAP).map_or(self.text.len(), |i| self.cursor + i)
    }

    /// Write `byte` over the character at the cursor and advance. With
    /// `skip_wraps` the cursor first steps over any wrap markers so they are
    /// preserved.
    pub fn overwrite(&mut self, byte: u8, skip_wraps: bool) {
        if self.rebuilding {
            self.clear();
        }
        if skip_wraps {
            while self.text.get(self.cursor) == Some(&WRAP) {
                self.cursor += 1;
            }
        }
        if self.cursor == self.text.len() {
            self.reserve(1);
            self.text.push(byte);
        } else {
            self.text[self.cursor] = byte;
        }
        self.cursor += 1;
    }

    /// Insert `n` blanks at the cursor; the cursor does not move.
    pub fn insert(&mut self, n: usize) {
        self.reserve(n);
        let at = self.cursor;
        self.text.splice(at..at, std::iter::repeat(b' ').take(n));
    }

    /// Insert one blank at the cursor and step past it. Markers after the
    /// cursor are left in place.
    pub fn insert_blank(&mut self) {
        if self.rebuilding {
            self.clear();
        }
        self.insert(1);
        self.cursor += 1;
    }

    /// Delete up to `n` characters at the cursor, stopping at the row end.
    pub fn delete(&mut self, n: usize) {
        let end = (self.cursor + n).min(self.row_end());
        self.text.drain(self.cursor..end);
    }

    /// Erase from the cursor to the end of its row.
    pub fn erase_right(&mut self) {
        let end = self.row_end();
        self.text.drain(self.cursor..end);
    }

    /// Blank from the start of the row through the cursor.
    pub fn erase_left(&mut self) {
        let start = self.row_start();
        let end = (self.cursor + 1).min(self.row_end());
        for b in &mut self.text[start..end] {
            *b = b' ';
        }
    }

    /// Erase the whole row holding the cursor and move to its start.
    pub fn erase_row(&mut self) {
        let start = self.row_start();
        let end = self.row_end();
        self.text.drain(start..end);
        self.cursor = start;
    }

    /// Drop everything from the cursor to the end of the line.
    pub fn truncate(&mut self) {
        self.text.truncate(self.cursor);
    }

    /// Move forward `n` columns. Returns how far the move would have gone
    /// past the end of the whole line, wrap markers not counted; the cursor
    /// itself stops at the end of its row.
    pub fn forward(&mut self, n: usize) -> usize {
        let ahead = self.text[self.cursor..].iter().filter(|b| **b != WRAP).count();
        self.cursor = (self.cursor + n).min(self.row_end());
        n.saturating_sub(ahead)
    }

    /// Move back `n` columns within the row. Returns false if the move would
    /// have crossed the row start; the cursor stops there.
    pub fn backward(&mut self, n: usize) -> bool {
        let start = self.row_start();
        if self.cursor < start + n {
            self.cursor = start;
            false
        } else {
            self.cursor -= n;
            true
        }
    }

    /// Move up `n` rows keeping the column. Returns false (cursor unchanged)
    /// if there are not enough rows above.
    pub fn up(&mut self, n: usize) -> bool {
        let column = self.cursor - self.row_start();
        let mut cursor = self.cursor;
        for _ in 0..n {
            let start = self.text[..cursor].iter().rposition(|b| *b == WRAP).map_or(0, |i| i + 1);
            if start == 0 {
                return false;
            }
            // `start - 1` is the marker ending the previous row.
            let prev_end = start - 1;
            let prev_start =
                self.text[..prev_end].iter().rposition(|b| *b == WRAP).map_or(0, |i| i + 1);
            cursor = (prev_start + column).min(prev_end);
        }
        self.cursor = cursor;
        true
    }

    /// Move to the start of the current row.
    pub fn carriage_return(&mut self) {
        self.cursor = self.row_start();
    }

    /// Record that the visible line wrapped at the cursor.
    pub fn wrap(&mut self) {
        if self.text.get(self.cursor) == Some(&WRAP) {
            self.cursor += 1;
            return;
        }
        self.reserve(1);
        self.text.insert(self.cursor, WRAP);
        self.cursor += 1;
    }

    /// Remove wrap markers left dangling at the end of the line.
    pub fn trim_wraps(&mut self) {
        while self.text.last() == Some(&WRAP) {
            self.text.pop();
        }
        self.cursor = self.cursor.min(self.text.len());
    }

    /// Whitespace-delimited word touching the cursor, wrap markers removed.
    pub fn word_at_cursor(&self) -> String {
        let is_sep = |b: &u8| *b == b' ' || *b == b'\t';
        let start = self.text[..self.cursor].iter().rposition(is_sep).map_or(0, |i| i + 1);
        let end =
            self.text[self.cursor..].iter().position(is_sep).map_or(self.text.len(), |i| self.cursor + i);
        let word: Vec<u8> = self.text[start..end].iter().copied().filter(|b| *b != WRAP).collect();
        String::from_utf8_lossy(&word).into_owned()
    }
}

#[cfg(test)]
#[path = "cmdline_tests.rs"]
mod tests;
