// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests driving a live router over its Unix socket.

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use seer::protocol::handshake;
use seer::protocol::{status, Channel, Frame, Param, DEFAULT_MAX_FRAME};
use seermux::config::MuxConfig;
use seermux::router::Router;

struct Running {
    dir: tempfile::TempDir,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<anyhow::Result<()>>>,
}

impl Running {
    fn start() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut router = Router::bind(&MuxConfig::test(dir.path().join("mux.sock")))?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                router.step()?;
            }
            Ok(())
        });
        Ok(Self { dir, stop, thread: Some(thread) })
    }

    fn connect(&self) -> anyhow::Result<Channel<UnixStream>> {
        let stream = UnixStream::connect(self.dir.path().join("mux.sock"))?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        Ok(Channel::new(stream, DEFAULT_MAX_FRAME))
    }

    fn display(&self) -> anyhow::Result<Channel<UnixStream>> {
        let mut chan = self.connect()?;
        let warning = handshake::display(&mut chan, handshake::version())?;
        assert_eq!(warning, None);
        Ok(chan)
    }

    fn session(&self, title: &str) -> anyhow::Result<Channel<UnixStream>> {
        let mut chan = self.connect()?;
        let accepted = handshake::client(&mut chan, &mut Vec::new(), handshake::version(), title)?;
        assert_eq!(accepted.expand_opts, "-a");
        Ok(chan)
    }

    fn stop(mut self) -> anyhow::Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        match self.thread.take().map(thread::JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => anyhow::bail!("router thread panicked"),
            None => Ok(()),
        }
    }
}

#[test]
fn session_frames_reach_the_display() -> anyhow::Result<()> {
    let mux = Running::start()?;
    let mut display = mux.display()?;
    let mut session = mux.session("seer-100")?;

    session.send(Param::Pid, "100")?;
    assert_eq!(display.recv()?, Frame::new(Param::Pid, "100"));
    assert_eq!(display.recv()?, Frame::new(Param::Status, status::PROMPT));

    session.send(Param::Cmd, "ls *.rs")?;
    assert_eq!(display.recv()?, Frame::new(Param::Cmd, "ls *.rs"));

    session.send(Param::Order, "up")?;
    assert_eq!(display.recv()?, Frame::new(Param::Order, "up"));

    mux.stop()
}

#[test]
fn display_picks_go_to_the_active_session() -> anyhow::Result<()> {
    let mux = Running::start()?;
    let mut display = mux.display()?;
    let mut first = mux.session("seer-1")?;
    let mut second = mux.session("seer-2")?;

    first.send(Param::Pwd, "/one")?;
    assert_eq!(display.recv()?, Frame::new(Param::Pwd, "/one"));
    display.recv()?;
    second.send(Param::Pwd, "/two")?;
    assert_eq!(display.recv()?, Frame::new(Param::Pwd, "/two"));
    display.recv()?;

    display.send(Param::File, "/two/notes.txt")?;
    assert_eq!(second.recv()?, Frame::new(Param::File, "/two/notes.txt"));

    display.send(Param::Key, "\x1b[A")?;
    assert_eq!(second.recv()?, Frame::new(Param::Key, "\x1b[A"));

    mux.stop()
}

#[test]
fn closing_the_active_session_tells_the_display() -> anyhow::Result<()> {
    let mux = Running::start()?;
    let mut display = mux.display()?;
    let mut session = mux.session("seer-5")?;

    session.send(Param::Status, status::EXECUTING)?;
    assert_eq!(display.recv()?, Frame::new(Param::Status, status::EXECUTING));
    drop(session);
    assert_eq!(display.recv()?, Frame::new(Param::Status, status::DEAD));

    mux.stop()
}

#[test]
fn bad_purpose_is_dropped_and_router_keeps_serving() -> anyhow::Result<()> {
    let mux = Running::start()?;
    let mut stranger = mux.connect()?;
    stranger.send(Param::Purpose, "spy")?;
    assert!(stranger.recv()?.is_eof());

    let mut display = mux.display()?;
    let mut session = mux.session("seer-6")?;
    session.send(Param::Cmd, "make")?;
    let frames = [display.recv()?, display.recv()?];
    assert!(frames.contains(&Frame::new(Param::Cmd, "make")));

    mux.stop()
}

#[test]
fn late_display_gets_the_active_session() -> anyhow::Result<()> {
    let mux = Running::start()?;
    let mut session = mux.session("seer-7")?;
    session.send(Param::Pwd, "/late")?;
    // Round trip through the router so the frame is processed first.
    let mut probe = mux.display()?;
    probe.recv()?;
    drop(probe);

    let mut display = mux.display()?;
    assert_eq!(display.recv()?, Frame::new(Param::Pwd, "/late"));

    mux.stop()
}
