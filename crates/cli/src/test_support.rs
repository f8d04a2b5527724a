// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: scripted streams, engine drivers, and
//! assertion helpers.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use crate::action::Action;
use crate::buffer::{Fill, SegmentedBuffer};
use crate::engine::Engine;
use crate::matcher::Mode;
use crate::shell::ShellFlavor;

/// Reader that hands out one scripted chunk per `read` call, then EOF.
#[derive(Debug, Default)]
pub struct ChunkReader {
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkReader {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self { chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect() }
    }

    pub fn is_drained(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

/// Writer that accepts at most `limit` bytes per call.
#[derive(Debug)]
pub struct TrickleWriter {
    pub written: Vec<u8>,
    limit: usize,
}

impl TrickleWriter {
    pub fn new(limit: usize) -> Self {
        Self { written: Vec::new(), limit: limit.max(1) }
    }
}

impl Write for TrickleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.limit);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An engine with one buffer per direction, fed directly from byte slices.
pub struct Harness {
    pub engine: Engine,
    pub term: SegmentedBuffer,
    pub shell: SegmentedBuffer,
    /// Everything flushed toward the shell.
    pub to_shell: Vec<u8>,
    /// Everything flushed toward the user's terminal.
    pub to_term: Vec<u8>,
}

impl Harness {
    pub fn new(flavor: ShellFlavor) -> Self {
        Self {
            engine: Engine::new(flavor),
            term: SegmentedBuffer::new(Mode::Term),
            shell: SegmentedBuffer::new(Mode::Executing),
            to_shell: Vec::new(),
            to_term: Vec::new(),
        }
    }

    /// Start with the shell sitting at an empty prompt.
    pub fn at_prompt(flavor: ShellFlavor) -> Self {
        let mut h = Self::new(flavor);
        h.shell.set_mode(Mode::Prompt);
        h
    }

    /// One pass of shell output.
    pub fn output(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.shell.prepend_holdover();
        if read_all(&mut self.shell, bytes)? {
            self.engine.process(&mut self.shell);
        }
        self.shell.flush(&mut self.to_term)
    }

    /// One pass of user keystrokes.
    pub fn input(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.term.prepend_holdover();
        if read_all(&mut self.term, bytes)? {
            self.engine.note_input(bytes);
            self.engine.process(&mut self.term);
        }
        self.term.flush(&mut self.to_shell)
    }

    pub fn mode(&self) -> Mode {
        self.shell.mode()
    }

    pub fn drain(&mut self) -> Vec<Action> {
        self.engine.actions().drain().collect()
    }
}

fn read_all(buf: &mut SegmentedBuffer, bytes: &[u8]) -> io::Result<bool> {
    let mut src = ChunkReader::new([bytes]);
    Ok(matches!(buf.read(&mut src)?, Fill::Data(n) if n > 0))
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        match $expr {
            Ok(_) => panic!("expected Err for: {}", stringify!($expr)),
            Err(err) => {
                let msg = err.to_string();
                assert!(
                    msg.contains($substr),
                    "expected error containing {:?}, got: {msg:?}",
                    $substr
                );
            }
        }
    }};
}
