// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;

use super::*;

#[test]
fn nonblocking_read_would_block() -> anyhow::Result<()> {
    let (mut a, _b) = UnixStream::pair()?;
    set_nonblocking(&a)?;
    let mut buf = [0u8; 8];
    let err = match a.read(&mut buf) {
        Ok(n) => anyhow::bail!("expected WouldBlock, read {n} bytes"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    Ok(())
}

#[test]
fn pty_fd_round_trip() -> anyhow::Result<()> {
    let (a, mut b) = UnixStream::pair()?;
    let mut pty = PtyFd::new(OwnedFd::from(a))?;
    pty.write_all(b"hello")?;
    let mut buf = [0u8; 5];
    b.read_exact(&mut buf)?;
    assert_eq!(&buf, b"hello");

    b.write_all(b"back")?;
    let mut got = [0u8; 4];
    let n = loop {
        match pty.read(&mut got) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            other => break other?,
        }
    };
    assert_eq!(&got[..n], b"back");
    Ok(())
}

#[test]
fn io_err_keeps_errno() {
    let e = io_err(nix::errno::Errno::EIO);
    assert_eq!(e.raw_os_error(), Some(nix::libc::EIO));
}
