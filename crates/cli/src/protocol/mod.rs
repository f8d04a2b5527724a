// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed `name:value` frames exchanged with the router.
//!
//! Layout: a 4-byte big-endian payload length, then `<name>:<value>` followed
//! by two ETB bytes. The length covers the name, separator, value and
//! terminator.

pub mod handshake;

use std::borrow::Cow;
use std::fmt;
use std::io::{self, IoSlice, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ErrorKind;

/// Ends every payload.
pub const TERMINATOR: &[u8] = b"\x17\x17";
/// Between the parameter name and its value.
pub const SEPARATOR: u8 = b':';
/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;
/// Largest payload accepted unless configured otherwise. Sized for large
/// directory listings in `vgexpand-data`.
pub const DEFAULT_MAX_FRAME: usize = 16 * 1024 * 1024;

/// Registered parameter names, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    None,
    Purpose,
    Version,
    Pid,
    Status,
    Pwd,
    Cmd,
    Mask,
    DevelopingMask,
    VgexpandData,
    Order,
    Key,
    File,
    WinId,
    Reason,
    Eof,
}

impl Param {
    pub const ALL: [Param; 16] = [
        Self::None,
        Self::Purpose,
        Self::Version,
        Self::Pid,
        Self::Status,
        Self::Pwd,
        Self::Cmd,
        Self::Mask,
        Self::DevelopingMask,
        Self::VgexpandData,
        Self::Order,
        Self::Key,
        Self::File,
        Self::WinId,
        Self::Reason,
        Self::Eof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Purpose => "purpose",
            Self::Version => "version",
            Self::Pid => "pid",
            Self::Status => "status",
            Self::Pwd => "pwd",
            Self::Cmd => "cmd",
            Self::Mask => "mask",
            Self::DevelopingMask => "developing-mask",
            Self::VgexpandData => "vgexpand-data",
            Self::Order => "order",
            Self::Key => "key",
            Self::File => "file",
            Self::WinId => "win-id",
            Self::Reason => "reason",
            Self::Eof => "eof",
        }
    }

    fn from_bytes(name: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str().as_bytes() == name)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Param {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or_else(|| ProtocolError::UnknownParam(s.to_owned()))
    }
}

/// Values of the `status` parameter.
pub mod status {
    pub const OK: &str = "ok";
    pub const WARNING: &str = "warning";
    pub const TITLE_SET: &str = "title-set";
    pub const DEAD: &str = "dead";
    pub const EXECUTING: &str = "executing";
    pub const PROMPT: &str = "prompt";
    pub const LOST: &str = "lost";
    pub const ERROR: &str = "error";
}

/// Values of the `order` parameter beyond the navigation words.
pub mod order {
    pub const SET_TITLE: &str = "set-title";
    pub const REFOCUS: &str = "refocus";
}

/// One decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub param: Param,
    pub value: Bytes,
}

impl Frame {
    pub fn new(param: Param, value: impl Into<Bytes>) -> Self {
        Self { param, value: value.into() }
    }

    /// Synthetic frame standing for a closed stream.
    pub fn eof() -> Self {
        Self { param: Param::Eof, value: Bytes::new() }
    }

    pub fn is_eof(&self) -> bool {
        self.param == Param::Eof
    }

    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

#[derive(Debug)]
pub enum ProtocolError {
    Io(io::Error),
    /// Declared payload does not end with the terminator.
    Unterminated { len: usize },
    UnknownParam(String),
    TooLarge { len: usize, max: usize },
    /// Payload has no `:` after the name.
    BadSeparator,
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Transport,
            Self::UnknownParam(_) => ErrorKind::Desync,
            Self::Unterminated { .. } | Self::TooLarge { .. } | Self::BadSeparator => {
                ErrorKind::Malformed
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "frame i/o: {e}"),
            Self::Unterminated { len } => write!(f, "no terminator within {len} byte frame"),
            Self::UnknownParam(name) => write!(f, "unknown parameter: {name}"),
            Self::TooLarge { len, max } => write!(f, "frame of {len} bytes exceeds {max}"),
            Self::BadSeparator => f.write_str("frame has no name separator"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

fn payload_len(param: Param, value: &[u8], max: usize) -> Result<usize, ProtocolError> {
    let len = param.as_str().len() + 1 + value.len() + TERMINATOR.len();
    if len > max || u32::try_from(len).is_err() {
        return Err(ProtocolError::TooLarge { len, max });
    }
    Ok(len)
}

/// Encode one frame into a contiguous buffer.
pub fn encode(param: Param, value: &[u8], max: usize) -> Result<Bytes, ProtocolError> {
    let len = payload_len(param, value, max)?;
    let mut out = BytesMut::with_capacity(HEADER_LEN + len);
    out.put_u32(len as u32);
    out.put_slice(param.as_str().as_bytes());
    out.put_u8(SEPARATOR);
    out.put_slice(value);
    out.put_slice(TERMINATOR);
    Ok(out.freeze())
}

/// Decode a payload (everything after the length prefix).
pub fn decode(payload: &[u8]) -> Result<Frame, ProtocolError> {
    let body = payload
        .strip_suffix(TERMINATOR)
        .ok_or(ProtocolError::Unterminated { len: payload.len() })?;
    let split = body.iter().position(|b| *b == SEPARATOR).ok_or(ProtocolError::BadSeparator)?;
    let (name, value) = (&body[..split], &body[split + 1..]);
    let param = Param::from_bytes(name)
        .ok_or_else(|| ProtocolError::UnknownParam(String::from_utf8_lossy(name).into_owned()))?;
    Ok(Frame { param, value: Bytes::copy_from_slice(value) })
}

/// Write one frame with a single vectored write, continuing over the
/// remaining slices until everything is out.
pub fn write_frame(
    w: &mut impl Write,
    param: Param,
    value: &[u8],
    max: usize,
) -> Result<(), ProtocolError> {
    let len = payload_len(param, value, max)?;
    let header = (len as u32).to_be_bytes();
    let separator = [SEPARATOR];
    let mut slices = [
        IoSlice::new(&header),
        IoSlice::new(param.as_str().as_bytes()),
        IoSlice::new(&separator),
        IoSlice::new(value),
        IoSlice::new(TERMINATOR),
    ];
    let mut remaining: &mut [IoSlice<'_>] = &mut slices;
    while !remaining.is_empty() {
        match w.write_vectored(remaining) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
            Ok(n) => IoSlice::advance_slices(&mut remaining, n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    w.flush()?;
    Ok(())
}

/// Fill `buf` completely. Returns false if the stream closed first.
fn fill(r: &mut impl Read, buf: &mut [u8]) -> Result<bool, ProtocolError> {
    let mut at = 0;
    while at < buf.len() {
        match r.read(&mut buf[at..]) {
            Ok(0) => return Ok(false),
            Ok(n) => at += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Read one frame. A stream that closes at any point yields [`Frame::eof`].
pub fn read_frame(r: &mut impl Read, max: usize) -> Result<Frame, ProtocolError> {
    let mut header = [0u8; HEADER_LEN];
    if !fill(r, &mut header)? {
        return Ok(Frame::eof());
    }
    let len = u32::from_be_bytes(header) as usize;
    if len > max {
        return Err(ProtocolError::TooLarge { len, max });
    }
    let mut payload = vec![0u8; len];
    if !fill(r, &mut payload)? {
        return Ok(Frame::eof());
    }
    decode(&payload)
}

/// Writer bound to one peer and frame limit.
#[derive(Debug)]
pub struct Channel<S> {
    stream: S,
    max: usize,
}

impl<S: Read + Write> Channel<S> {
    pub fn new(stream: S, max: usize) -> Self {
        Self { stream, max }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn send(&mut self, param: Param, value: impl AsRef<[u8]>) -> Result<(), ProtocolError> {
        write_frame(&mut self.stream, param, value.as_ref(), self.max)
    }

    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.send(frame.param, &frame.value)
    }

    pub fn recv(&mut self) -> Result<Frame, ProtocolError> {
        read_frame(&mut self.stream, self.max)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
