// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frames crossing a real socket between threads.

use std::os::unix::net::UnixStream;
use std::thread;

use seer::error::ErrorKind;
use seer::protocol::{Channel, Frame, Param, DEFAULT_MAX_FRAME};

#[test]
fn large_expansion_survives_the_socket() -> anyhow::Result<()> {
    let (a, b) = UnixStream::pair()?;
    let data: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = data.clone();

    let writer = thread::spawn(move || -> anyhow::Result<()> {
        let mut chan = Channel::new(a, DEFAULT_MAX_FRAME);
        chan.send(Param::Mask, "*.rs")?;
        chan.send(Param::VgexpandData, &data)?;
        Ok(())
    });

    let mut chan = Channel::new(b, DEFAULT_MAX_FRAME);
    let mask = chan.recv()?;
    assert_eq!(mask.param, Param::Mask);
    assert_eq!(mask.value_str(), "*.rs");
    let expansion = chan.recv()?;
    assert_eq!(expansion.param, Param::VgexpandData);
    assert_eq!(expansion.value.as_ref(), expected.as_slice());
    writer.join().map_err(|_| anyhow::anyhow!("writer panicked"))??;

    assert!(chan.recv()?.is_eof());
    Ok(())
}

#[test]
fn reader_limit_rejects_oversized_frames() -> anyhow::Result<()> {
    let (a, b) = UnixStream::pair()?;
    let mut tx = Channel::new(a, DEFAULT_MAX_FRAME);
    let mut rx = Channel::new(b, 64);
    tx.send(Param::Cmd, vec![b'x'; 128])?;
    let err = match rx.recv() {
        Ok(frame) => anyhow::bail!("expected an error, got {frame:?}"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Malformed);
    Ok(())
}

#[test]
fn frames_flow_both_ways() -> anyhow::Result<()> {
    let (a, b) = UnixStream::pair()?;
    let echo = thread::spawn(move || -> anyhow::Result<()> {
        let mut chan = Channel::new(a, DEFAULT_MAX_FRAME);
        loop {
            let frame = chan.recv()?;
            if frame.is_eof() {
                return Ok(());
            }
            chan.send_frame(&frame)?;
        }
    });

    let mut chan = Channel::new(b, DEFAULT_MAX_FRAME);
    for frame in [
        Frame::new(Param::Cmd, "git status"),
        Frame::new(Param::Pwd, "/srv/app"),
        Frame::new(Param::Key, "\x1b[A"),
    ] {
        chan.send_frame(&frame)?;
        assert_eq!(chan.recv()?, frame);
    }
    drop(chan);
    echo.join().map_err(|_| anyhow::anyhow!("echo panicked"))??;
    Ok(())
}
