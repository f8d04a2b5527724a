// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segmented read buffer for one direction of the intercepted stream.
//!
//! Bytes read from a descriptor are scanned in place by the matcher. The
//! buffer tracks the start of the candidate segment (`pos`) and how many bytes
//! the matcher has consumed into it (`seglen`). A segment that is still
//! matching when the data runs out becomes a holdover and is re-scanned at
//! the front of the next read.

use std::io::{self, Read, Write};

use bytes::BytesMut;

use crate::matcher::Mode;

/// Bytes requested from the descriptor on each read.
pub const READ_CHUNK: usize = 4096;

/// Outcome of a single [`SegmentedBuffer::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// This many bytes were appended (zero when the read would block).
    Data(usize),
    /// The descriptor reached end-of-stream.
    Eof,
}

#[derive(Debug)]
struct Holdover {
    bytes: Vec<u8>,
    /// The bytes already went downstream and are only kept for re-scanning.
    written: bool,
}

#[derive(Debug)]
pub struct SegmentedBuffer {
    data: BytesMut,
    pos: usize,
    seglen: usize,
    holdover: Option<Holdover>,
    /// Length of the holdover placed at the front of `data` for this pass.
    carried: usize,
    /// Leading bytes of `data` that must not be flushed again.
    skip: usize,
    mode: Mode,
}

impl SegmentedBuffer {
    pub fn new(mode: Mode) -> Self {
        Self {
            data: BytesMut::with_capacity(READ_CHUNK),
            pos: 0,
            seglen: 0,
            holdover: None,
            carried: 0,
            skip: 0,
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Start a new pass: discard flushed data and put any holdover back at the
    /// front, with the scan cursor on its first byte.
    pub fn prepend_holdover(&mut self) {
        self.data.clear();
        self.pos = 0;
        self.seglen = 0;
        self.skip = 0;
        self.carried = 0;
        if let Some(held) = self.holdover.take() {
            self.data.reserve(held.bytes.len() + READ_CHUNK);
            self.data.extend_from_slice(&held.bytes);
            self.carried = held.bytes.len();
            if held.written {
                self.skip = held.bytes.len();
            }
        }
    }

    /// Read once from `src`, appending after whatever is already buffered.
    pub fn read(&mut self, src: &mut impl Read) -> io::Result<Fill> {
        let start = self.data.len();
        self.data.resize(start + READ_CHUNK, 0);
        let result = loop {
            match src.read(&mut self.data[start..]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        match result {
            Ok(0) => {
                self.data.truncate(start);
                Ok(Fill::Eof)
            }
            Ok(n) => {
                self.data.truncate(start + n);
                Ok(Fill::Data(n))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.data.truncate(start);
                Ok(Fill::Data(0))
            }
            Err(e) => {
                self.data.truncate(start);
                Err(e)
            }
        }
    }

    pub fn filled(&self) -> usize {
        self.data.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seglen(&self) -> usize {
        self.seglen
    }

    pub fn is_mid_match(&self) -> bool {
        self.seglen > 0
    }

    /// Extend the candidate segment by one byte and return it.
    pub fn next_byte(&mut self) -> Option<u8> {
        let at = self.pos + self.seglen;
        let byte = *self.data.get(at)?;
        self.seglen += 1;
        Some(byte)
    }

    /// The candidate segment consumed so far.
    pub fn segment(&self) -> &[u8] {
        &self.data[self.pos..self.pos + self.seglen]
    }

    /// Delete the candidate segment so it never reaches the consumer.
    pub fn eat_segment(&mut self) {
        let end = self.pos + self.seglen;
        self.skip = shrink_mark(self.skip, self.pos, end);
        self.carried = shrink_mark(self.carried, self.pos, end);
        let len = self.data.len();
        self.data.copy_within(end..len, self.pos);
        self.data.truncate(len - self.seglen);
        self.seglen = 0;
    }

    /// Leave the candidate segment in place and move the cursor past it.
    pub fn pass_segment(&mut self) {
        self.pos += self.seglen;
        self.seglen = 0;
    }

    /// Pass only the first `keep` bytes of the segment; the rest is scanned
    /// again as the start of a new segment.
    pub fn pass_partial(&mut self, keep: usize) {
        let keep = keep.min(self.seglen);
        self.pos += keep;
        self.seglen = 0;
    }

    /// Whether the current segment began inside bytes carried over from the
    /// previous read.
    pub fn segment_was_carried(&self) -> bool {
        self.seglen > 0 && self.pos < self.carried
    }

    /// Save the unmatched tail for the next read.
    ///
    /// With `write_now` false the tail is withheld from the next flush; with
    /// `write_now` true it is flushed now and only re-scanned later.
    pub fn create_holdover(&mut self, write_now: bool) {
        let bytes = self.data[self.pos..].to_vec();
        let written = write_now || self.pos < self.skip;
        if !written {
            self.data.truncate(self.pos);
        }
        self.holdover = Some(Holdover { bytes, written });
        self.seglen = 0;
    }

    /// Holdover bytes not yet released downstream.
    pub fn withheld(&self) -> &[u8] {
        match &self.holdover {
            Some(held) if !held.written => &held.bytes,
            _ => &[],
        }
    }

    pub fn has_holdover(&self) -> bool {
        self.holdover.is_some()
    }

    /// Pass everything left unscanned. Used when interception is off.
    pub fn pass_all(&mut self) {
        self.pos = self.data.len();
        self.seglen = 0;
    }

    /// Bytes the consumer has not seen yet.
    pub fn pending(&self) -> &[u8] {
        &self.data[self.skip.min(self.data.len())..]
    }

    /// Write the pending bytes to `out` and mark them flushed.
    pub fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        let pending = self.pending();
        if !pending.is_empty() {
            out.write_all(pending)?;
            out.flush()?;
        }
        self.skip = self.data.len();
        Ok(())
    }
}

/// Recompute a leading-region mark after `start..end` is removed.
fn shrink_mark(mark: usize, start: usize, end: usize) -> usize {
    mark.min(start) + mark.saturating_sub(end)
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
