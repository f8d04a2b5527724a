// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness-poll loop multiplexing sessions toward one display.

use std::collections::BTreeMap;
use std::os::fd::AsFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::{debug, info, warn};

use seer::protocol::handshake::{self, Peer};
use seer::protocol::{status, Channel, Frame, Param};

use crate::config::MuxConfig;
use crate::state::{ClientId, MuxState, SessionRecord, Update};

/// Upper bound on each handshake read.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Listener,
    Display,
    Client(ClientId),
}

pub struct Router {
    listener: UnixListener,
    socket: PathBuf,
    display: Option<Channel<UnixStream>>,
    clients: BTreeMap<ClientId, Channel<UnixStream>>,
    state: MuxState,
    expand_opts: String,
    max_frame: usize,
    poll_timeout: PollTimeout,
}

impl Router {
    /// Listen on the configured socket, replacing a stale socket file.
    pub fn bind(config: &MuxConfig) -> anyhow::Result<Self> {
        match std::fs::remove_file(&config.socket) {
            Ok(()) => debug!(socket = %config.socket.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("remove stale {}", config.socket.display()))
            }
        }
        let listener = UnixListener::bind(&config.socket)
            .with_context(|| format!("bind {}", config.socket.display()))?;
        Ok(Self {
            listener,
            socket: config.socket.clone(),
            display: None,
            clients: BTreeMap::new(),
            state: MuxState::new(),
            expand_opts: config.expand_opts.clone(),
            max_frame: config.max_frame,
            poll_timeout: PollTimeout::from(config.poll_ms),
        })
    }

    /// Serve until the process is killed.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!(socket = %self.socket.display(), "router listening");
        loop {
            self.step()?;
        }
    }

    /// Wait once and service a single ready source.
    pub fn step(&mut self) -> anyhow::Result<()> {
        match self.wait()? {
            None => {}
            Some(Source::Listener) => self.accept(),
            Some(Source::Display) => self.service_display(),
            Some(Source::Client(id)) => self.service_client(id),
        }
        Ok(())
    }

    fn wait(&self) -> anyhow::Result<Option<Source>> {
        let mut sources = Vec::with_capacity(2 + self.clients.len());
        let mut fds = Vec::with_capacity(2 + self.clients.len());
        sources.push(Source::Listener);
        fds.push(PollFd::new(self.listener.as_fd(), PollFlags::POLLIN));
        if let Some(display) = &self.display {
            sources.push(Source::Display);
            fds.push(PollFd::new(display.get_ref().as_fd(), PollFlags::POLLIN));
        }
        for (id, chan) in &self.clients {
            sources.push(Source::Client(*id));
            fds.push(PollFd::new(chan.get_ref().as_fd(), PollFlags::POLLIN));
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

    fn accept(&mut self) {
        let stream = match self.listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(err = %e, "accept failed");
                return;
            }
        };
        if let Err(e) = self.admit(stream) {
            warn!("handshake failed, dropping connection: {e:#}");
        }
    }

    fn admit(&mut self, stream: UnixStream) -> anyhow::Result<()> {
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).context("set handshake timeout")?;
        let mut chan = Channel::new(stream, self.max_frame);
        let peer = handshake::serve(&mut chan, handshake::version(), &self.expand_opts)?;
        chan.get_ref().set_read_timeout(None).context("clear handshake timeout")?;

        match peer {
            Peer::Display { version } => {
                if self.display.is_some() {
                    warn!("replacing connected display");
                }
                info!(%version, "display connected");
                self.display = Some(chan);
                let snapshot = self.state.active_record().map(SessionRecord::snapshot);
                for frame in snapshot.unwrap_or_default() {
                    self.to_display(&frame);
                }
            }
            Peer::Session { version, title } => {
                let id = self.state.register(SessionRecord::new(version.clone(), title.clone()));
                info!(client = id, %version, %title, "session connected");
                self.clients.insert(id, chan);
            }
        }
        Ok(())
    }

    fn service_display(&mut self) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        let frame = match display.recv() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = %e.kind(), err = %e, "display read failed");
                self.display = None;
                return;
            }
        };
        match frame.param {
            Param::Eof => {
                info!("display disconnected");
                self.display = None;
            }
            Param::File | Param::Key | Param::Order => self.to_active(&frame),
            other => warn!(param = %other, "ignoring frame from display"),
        }
    }

    fn service_client(&mut self, id: ClientId) {
        let Some(chan) = self.clients.get_mut(&id) else {
            return;
        };
        let frame = match chan.recv() {
            Ok(frame) if frame.is_eof() => {
                self.drop_client(id);
                return;
            }
            Ok(frame) => frame,
            Err(e) => {
                warn!(client = id, kind = %e.kind(), err = %e, "session read failed");
                self.drop_client(id);
                return;
            }
        };
        debug!(client = id, param = %frame.param, len = frame.value.len(), "frame from session");
        match self.state.update(id, &frame) {
            Update::Forward => self.to_display(&frame),
            Update::Activated => {
                debug!(client = id, "session became active");
                let snapshot = self.state.get(id).map(SessionRecord::snapshot);
                for f in snapshot.unwrap_or_default() {
                    self.to_display(&f);
                }
                if frame.param == Param::Order {
                    self.to_display(&frame);
                }
            }
            Update::Rejected => warn!(client = id, param = %frame.param, "ignoring frame"),
            Update::Unknown => {}
        }
    }

    fn drop_client(&mut self, id: ClientId) {
        self.clients.remove(&id);
        if let Some((record, was_active)) = self.state.remove(id) {
            info!(client = id, pid = ?record.pid, "session closed");
            if was_active {
                self.to_display(&Frame::new(Param::Status, status::DEAD));
            }
        }
    }

    /// Forward a display frame to the active session.
    fn to_active(&mut self, frame: &Frame) {
        let Some(id) = self.state.active() else {
            debug!(param = %frame.param, "no active session");
            return;
        };
        let Some(chan) = self.clients.get_mut(&id) else {
            return;
        };
        if let Err(e) = chan.send_frame(frame) {
            warn!(client = id, err = %e, "session write failed");
            self.drop_client(id);
        }
    }

    fn to_display(&mut self, frame: &Frame) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        if let Err(e) = display.send_frame(frame) {
            warn!(err = %e, "display write failed");
            self.display = None;
        }
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket);
    }
}
