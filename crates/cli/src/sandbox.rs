// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secondary shell that evaluates globs in the command being typed.
//!
//! One evaluation runs at a time. A request arriving while one is running is
//! queued, and a newer request replaces the queued one.

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{bail, Context};
use tracing::{debug, warn};

use crate::pty::nbio::set_nonblocking;
use crate::sanitize::{sanitize_command, sanitize_mask};

/// Line printed by the sandbox after each evaluation.
pub const SENTINEL: &[u8] = b"\x17seer-expand-done\x17\n";
const SENTINEL_CMD: &str = r"printf '\027seer-expand-done\027\n'";

/// The side-channel command evaluated for one mask.
pub fn expand_invocation(pwd: &str, tool: &str, opts: &str, mask: &str, cmd: &str) -> String {
    format!(
        "cd '{}' && {tool} {opts} -m '{}' -- {} ; cd /",
        sanitize_mask(pwd),
        sanitize_mask(mask),
        sanitize_command(cmd)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Request {
    mask: String,
    line: String,
}

/// Output of one finished evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub mask: String,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct Sandbox<R, W> {
    stdout: R,
    stdin: W,
    tool: String,
    opts: String,
    output: Vec<u8>,
    running: Option<String>,
    queued: Option<Request>,
}

/// Sandbox backed by a real `sh` child.
pub type ShellSandbox = Sandbox<ChildStdout, ChildStdin>;

/// Spawn `sh` with piped stdio and a non-blocking stdout.
pub fn spawn(tool: &str, opts: &str) -> anyhow::Result<(Child, ShellSandbox)> {
    let mut child = Command::new("sh")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn sandbox shell")?;
    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        bail!("sandbox shell has no pipes");
    };
    set_nonblocking(&stdout).context("sandbox stdout non-blocking")?;
    debug!(pid = child.id(), "sandbox started");
    Ok((child, Sandbox::new(stdout, stdin, tool, opts)))
}

impl<R: Read, W: Write> Sandbox<R, W> {
    pub fn new(stdout: R, stdin: W, tool: &str, opts: &str) -> Self {
        Self {
            stdout,
            stdin,
            tool: tool.to_owned(),
            opts: opts.to_owned(),
            output: Vec::new(),
            running: None,
            queued: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// Evaluate `mask` for `cmd` in `pwd`, now or after the running one.
    pub fn request(&mut self, pwd: &str, mask: &str, cmd: &str) -> anyhow::Result<()> {
        let line = expand_invocation(pwd, &self.tool, &self.opts, mask, cmd);
        let req = Request { mask: mask.to_owned(), line };
        if self.running.is_some() {
            self.queued = Some(req);
            return Ok(());
        }
        self.start(req)
    }

    fn start(&mut self, req: Request) -> anyhow::Result<()> {
        debug!(mask = %req.mask, "sandbox evaluation started");
        writeln!(self.stdin, "{}", req.line).context("write to sandbox")?;
        writeln!(self.stdin, "{SENTINEL_CMD}").context("write to sandbox")?;
        self.stdin.flush().context("flush sandbox")?;
        self.output.clear();
        self.running = Some(req.mask);
        Ok(())
    }

    /// Drain readable output. Returns the finished evaluation once its
    /// sentinel arrives, and starts the queued request if there is one.
    pub fn read(&mut self) -> anyhow::Result<Option<Expansion>> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stdout.read(&mut chunk) {
                Ok(0) => bail!("sandbox shell exited"),
                Ok(n) => self.output.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e).context("read from sandbox"),
            }
        }
        let Some(end) = find(&self.output, SENTINEL) else {
            return Ok(None);
        };
        let data = self.output[..end].to_vec();
        self.output.drain(..end + SENTINEL.len());
        let Some(mask) = self.running.take() else {
            warn!(len = data.len(), "sandbox output with nothing running");
            return Ok(None);
        };
        if let Some(next) = self.queued.take() {
            self.start(next)?;
        }
        Ok(Some(Expansion { mask, data }))
    }
}

impl<R: AsFd, W> Sandbox<R, W> {
    /// Descriptor to poll for sandbox output.
    pub fn stdout_fd(&self) -> BorrowedFd<'_> {
        self.stdout.as_fd()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
