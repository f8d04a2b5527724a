// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session struct and the readiness-poll loop.

use std::io::Write;
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::time::Duration;

use anyhow::{bail, Context};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::buffer::{Fill, SegmentedBuffer};
use crate::config::Config;
use crate::engine::Engine;
use crate::matcher::Mode;
use crate::protocol::{handshake, status, Channel, Param};
use crate::pty::{ExitStatus, ShellPty};
use crate::sandbox::{self, ShellSandbox};
use crate::shell::ShellFlavor;

use super::transition::{self, Inbound};
use super::Terminal;

/// Upper bound on each handshake read.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Descriptors the loop waits on, in service priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Router,
    Terminal,
    Shell,
    Sandbox,
}

/// One intercepted shell and everything wired to it.
pub struct Session {
    engine: Engine,
    term_buf: SegmentedBuffer,
    shell_buf: SegmentedBuffer,
    term: Terminal,
    pty: ShellPty,
    socket: Option<PathBuf>,
    router: Option<Channel<UnixStream>>,
    sandbox: Option<(Child, ShellSandbox)>,
    expand_tool: String,
    max_frame: usize,
    poll_timeout: PollTimeout,
    last_size: Option<(u16, u16)>,
    shell_done: bool,
    exiting: bool,
}

impl Session {
    pub fn new(config: &Config, flavor: ShellFlavor, pty: ShellPty, term: Terminal) -> Self {
        Self {
            engine: Engine::new(flavor),
            term_buf: SegmentedBuffer::new(Mode::Term),
            shell_buf: SegmentedBuffer::new(Mode::Executing),
            term,
            pty,
            socket: config.socket.clone(),
            router: None,
            sandbox: None,
            expand_tool: config.expand_tool.clone(),
            max_frame: config.max_frame,
            poll_timeout: PollTimeout::from(config.poll_ms),
            last_size: None,
            shell_done: false,
            exiting: false,
        }
    }

    /// Connect to the router if one is configured. Any failure leaves the
    /// session in pass-through.
    pub fn connect(&mut self) {
        let Some(path) = self.socket.clone() else {
            info!("no router socket, running unobserved");
            self.engine.disable();
            return;
        };
        if let Err(e) = self.handshake(&path) {
            warn!("router unavailable, running unobserved: {e:#}");
            self.drop_router();
        }
    }

    fn handshake(&mut self, path: &Path) -> anyhow::Result<()> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("connect to {}", path.display()))?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).context("set handshake timeout")?;
        let mut chan = Channel::new(stream, self.max_frame);
        let title = handshake::temporary_title(std::process::id());
        let accepted =
            handshake::client(&mut chan, &mut self.term.output, handshake::version(), &title)?;
        if let Some(reason) = accepted.warning {
            warn!(%reason, "continuing despite router warning");
        }
        chan.get_ref().set_read_timeout(None).context("clear handshake timeout")?;
        chan.send(Param::Pid, self.pty.child_pid().to_string())?;

        self.sandbox = Some(sandbox::spawn(&self.expand_tool, &accepted.expand_opts)?);
        self.router = Some(chan);
        info!(socket = %path.display(), "connected to router");
        Ok(())
    }

    /// Run until the shell exits or the terminal goes away.
    pub fn run(&mut self) -> anyhow::Result<ExitStatus> {
        let result = self.run_loop();
        if result.is_err() {
            self.send(Param::Status, status::DEAD.as_bytes());
        }
        self.stop_sandbox();
        result?;
        if self.shell_done {
            self.pty.wait()
        } else {
            // Dropping the PTY hangs up the shell.
            Ok(ExitStatus { code: None, signal: Some(Signal::SIGHUP as i32) })
        }
    }

    fn run_loop(&mut self) -> anyhow::Result<()> {
        self.sync_window_size();
        while !self.exiting {
            match self.wait()? {
                None => self.sync_window_size(),
                Some(Source::Router) => self.service_router()?,
                Some(Source::Terminal) => self.service_terminal()?,
                Some(Source::Shell) => self.service_shell()?,
                Some(Source::Sandbox) => self.service_sandbox(),
            }
        }
        Ok(())
    }

    /// Block until a source is ready. `None` on timeout.
    fn wait(&self) -> anyhow::Result<Option<Source>> {
        let mut sources = Vec::with_capacity(4);
        let mut fds = Vec::with_capacity(4);
        if let Some(chan) = &self.router {
            sources.push(Source::Router);
            fds.push(PollFd::new(chan.get_ref().as_fd(), PollFlags::POLLIN));
        }
        sources.push(Source::Terminal);
        fds.push(PollFd::new(self.term.input.as_fd(), PollFlags::POLLIN));
        sources.push(Source::Shell);
        fds.push(PollFd::new(self.pty.master().as_fd(), PollFlags::POLLIN));
        if let Some((_, sb)) = &self.sandbox {
            sources.push(Source::Sandbox);
            fds.push(PollFd::new(sb.stdout_fd(), PollFlags::POLLIN));
        }

        match poll(&mut fds, self.poll_timeout) {
            Ok(0) | Err(Errno::EINTR) => return Ok(None),
            Ok(_) => {}
            Err(e) => bail!("poll failed: {e}"),
        }
        let ready =
            PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL;
        Ok(fds
            .iter()
            .zip(sources)
            .find(|(fd, _)| fd.revents().is_some_and(|r| r.intersects(ready)))
            .map(|(_, source)| source))
    }

    fn service_terminal(&mut self) -> anyhow::Result<()> {
        self.term_buf.prepend_holdover();
        match self.term_buf.read(&mut self.term.input).context("read from terminal")? {
            Fill::Eof => {
                info!("terminal closed");
                self.term_buf.pass_all();
                self.engine.actions().push(Action::Exit);
            }
            Fill::Data(_) => {
                self.engine.note_input(self.term_buf.pending());
                self.engine.process(&mut self.term_buf);
            }
        }
        self.term_buf.flush(&mut self.pty.master()).context("write to shell")?;
        self.drain_actions();
        Ok(())
    }

    fn service_shell(&mut self) -> anyhow::Result<()> {
        self.shell_buf.prepend_holdover();
        match self.shell_buf.read(&mut self.pty.master()).context("read from shell")? {
            Fill::Eof => {
                info!("shell exited");
                self.shell_done = true;
                self.shell_buf.pass_all();
                self.engine.actions().push(Action::Exit);
            }
            Fill::Data(_) => self.engine.process(&mut self.shell_buf),
        }
        self.shell_buf.flush(&mut self.term.output).context("write to terminal")?;
        self.drain_actions();
        Ok(())
    }

    fn service_router(&mut self) -> anyhow::Result<()> {
        let Some(chan) = self.router.as_mut() else {
            return Ok(());
        };
        let frame = match chan.recv() {
            Ok(frame) => frame,
            Err(e) if e.kind().is_fatal() => {
                warn!(kind = %e.kind(), err = %e, "router connection failed");
                self.drop_router();
                return Ok(());
            }
            Err(e) => {
                warn!(kind = %e.kind(), err = %e, "bad frame from router");
                self.engine.actions().push(Action::Disable);
                self.drain_actions();
                return Ok(());
            }
        };
        debug!(param = %frame.param, len = frame.value.len(), "frame from router");
        match transition::inbound(&frame, &mut self.engine) {
            Inbound::Inject(bytes) => {
                let mut master = self.pty.master();
                master.write_all(&bytes).context("inject into shell")?;
            }
            Inbound::Ignore => {}
            Inbound::RouterGone => {
                info!("router closed the connection");
                self.drop_router();
            }
            Inbound::Desync => {
                warn!(param = %frame.param, "unexpected frame from router");
                self.engine.actions().push(Action::Disable);
            }
        }
        self.drain_actions();
        Ok(())
    }

    fn service_sandbox(&mut self) {
        let Some((_, sb)) = self.sandbox.as_mut() else {
            return;
        };
        match sb.read() {
            Ok(Some(expansion)) => {
                debug!(mask = %expansion.mask, len = expansion.data.len(), "expansion ready");
                self.send(Param::Mask, expansion.mask.as_bytes());
                self.send(Param::VgexpandData, &expansion.data);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("sandbox failed, expansions off: {e:#}");
                self.stop_sandbox();
            }
        }
    }

    /// Turn every queued action into at most one frame, in priority order.
    fn drain_actions(&mut self) {
        while let Some(action) = self.engine.actions().pop() {
            let at_prompt = matches!(self.shell_buf.mode(), Mode::Prompt | Mode::RightPrompt);
            if let Some((param, value)) = transition::outbound(action, &self.engine, at_prompt) {
                self.send(param, value.as_bytes());
            }
            match action {
                Action::SendCommand if at_prompt => self.evaluate(),
                Action::Disable => self.engine.disable(),
                Action::Exit => self.exiting = true,
                _ => {}
            }
        }
    }

    /// Ask the sandbox to expand the word under the cursor.
    fn evaluate(&mut self) {
        if self.engine.is_disabled() {
            return;
        }
        let Some((_, sb)) = self.sandbox.as_mut() else {
            return;
        };
        let cmd = self.engine.cmdline().text();
        if sb.is_busy() {
            debug!(mask = %self.engine.mask(), "expansion queued behind the running one");
        }
        if let Err(e) = sb.request(self.engine.pwd(), self.engine.mask(), &cmd) {
            warn!("sandbox request failed, expansions off: {e:#}");
            self.stop_sandbox();
        }
    }

    fn send(&mut self, param: Param, value: &[u8]) {
        let Some(chan) = self.router.as_mut() else {
            return;
        };
        match chan.send(param, value) {
            Ok(()) => {}
            Err(e) if e.kind().is_fatal() => {
                warn!(%param, err = %e, "router write failed");
                self.drop_router();
            }
            Err(e) => warn!(%param, err = %e, "frame dropped"),
        }
    }

    fn drop_router(&mut self) {
        self.router = None;
        self.stop_sandbox();
        self.engine.disable();
    }

    fn stop_sandbox(&mut self) {
        if let Some((mut child, _)) = self.sandbox.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn sync_window_size(&mut self) {
        let Some(size) = self.term.size() else {
            return;
        };
        if self.last_size == Some(size) {
            return;
        }
        match self.pty.resize(size.0, size.1) {
            Ok(()) => {
                debug!(cols = size.0, rows = size.1, "window size synced");
                self.last_size = Some(size);
            }
            Err(e) => debug!("resize failed: {e:#}"),
        }
    }
}
