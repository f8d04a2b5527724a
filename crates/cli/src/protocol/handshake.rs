// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handshakes between a session, the router and the display.

use std::io::{Read, Write};

use anyhow::{bail, Context};
use tracing::{debug, warn};

use super::{order, status, Channel, Frame, Param};

/// `purpose` announced by an interactive session.
pub const PURPOSE_SESSION: &str = "seer";
/// `purpose` announced by the display.
pub const PURPOSE_DISPLAY: &str = "display";
/// Window title set once the router has located the terminal window.
pub const FINAL_TITLE: &str = "seer";

/// Version string exchanged during the handshake.
pub fn version() -> &'static str {
    option_env!("SEER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Temporary title the router uses to find this session's window.
pub fn temporary_title(pid: u32) -> String {
    format!("seer-{pid}")
}

/// `OSC 2` sequence setting the terminal window title.
pub fn title_sequence(title: &str) -> Vec<u8> {
    format!("\x1b]2;{title}\x07").into_bytes()
}

/// What the client learned from a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Reason given by the router for a version mismatch.
    pub warning: Option<String>,
    /// Options for the expand tool, passed verbatim.
    pub expand_opts: String,
}

/// Who connected to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    Session { version: String, title: String },
    Display { version: String },
}

fn expect<S: Read + Write>(chan: &mut Channel<S>, param: Param) -> anyhow::Result<Frame> {
    let frame = chan.recv().with_context(|| format!("read {param} during handshake"))?;
    if frame.param != param {
        bail!("expected {param} during handshake, got {}", frame.param);
    }
    Ok(frame)
}

fn mismatch_reason(theirs: &str, ours: &str) -> String {
    format!("version mismatch: peer {theirs}, router {ours}")
}

/// Client half: announce the session and wait for the router to accept it.
///
/// `term` is the user's terminal, used to set the window title the router
/// looks for.
pub fn client<S: Read + Write>(
    chan: &mut Channel<S>,
    term: &mut impl Write,
    version: &str,
    title: &str,
) -> anyhow::Result<Accepted> {
    term.write_all(&title_sequence(title)).context("write window title")?;
    term.flush().context("flush window title")?;

    chan.send(Param::Purpose, PURPOSE_SESSION)?;
    chan.send(Param::Version, version)?;
    chan.send(Param::WinId, title)?;

    let reply = expect(chan, Param::Status)?;
    let warning = match reply.value.as_ref() {
        v if v == status::OK.as_bytes() => None,
        v if v == status::WARNING.as_bytes() => {
            let reason = expect(chan, Param::Reason)?;
            warn!(reason = %reason.value_str(), "router accepted with a warning");
            Some(reason.value_str().into_owned())
        }
        _ => bail!("router refused the session: status {}", reply.value_str()),
    };

    let frame = expect(chan, Param::Order)?;
    if frame.value.as_ref() != order::SET_TITLE.as_bytes() {
        bail!("expected set-title order, got {}", frame.value_str());
    }
    term.write_all(&title_sequence(FINAL_TITLE)).context("write window title")?;
    term.flush().context("flush window title")?;
    chan.send(Param::Status, status::TITLE_SET)?;

    let opts = expect(chan, Param::VgexpandData)?;
    debug!(opts = %opts.value_str(), "handshake complete");
    Ok(Accepted { warning, expand_opts: opts.value_str().into_owned() })
}

/// Display half: announce the display and read the router's verdict.
pub fn display<S: Read + Write>(
    chan: &mut Channel<S>,
    version: &str,
) -> anyhow::Result<Option<String>> {
    chan.send(Param::Purpose, PURPOSE_DISPLAY)?;
    chan.send(Param::Version, version)?;
    let reply = expect(chan, Param::Status)?;
    match reply.value.as_ref() {
        v if v == status::OK.as_bytes() => Ok(None),
        v if v == status::WARNING.as_bytes() => {
            Ok(Some(expect(chan, Param::Reason)?.value_str().into_owned()))
        }
        _ => bail!("router refused the display: status {}", reply.value_str()),
    }
}

/// Send `status=ok`, or `status=warning` plus a `reason` when versions differ.
fn verdict<S: Read + Write>(chan: &mut Channel<S>, theirs: &str, ours: &str) -> anyhow::Result<()> {
    if theirs == ours {
        chan.send(Param::Status, status::OK)?;
    } else {
        warn!(peer = theirs, router = ours, "version mismatch");
        chan.send(Param::Status, status::WARNING)?;
        chan.send(Param::Reason, mismatch_reason(theirs, ours))?;
    }
    Ok(())
}

/// Router half. An unknown purpose is an error; the caller drops the
/// connection.
pub fn serve<S: Read + Write>(
    chan: &mut Channel<S>,
    version: &str,
    expand_opts: &str,
) -> anyhow::Result<Peer> {
    let purpose = expect(chan, Param::Purpose)?;
    match purpose.value.as_ref() {
        p if p == PURPOSE_SESSION.as_bytes() => {
            let theirs = expect(chan, Param::Version)?.value_str().into_owned();
            let title = expect(chan, Param::WinId)?.value_str().into_owned();
            verdict(chan, &theirs, version)?;
            chan.send(Param::Order, order::SET_TITLE)?;
            let confirm = expect(chan, Param::Status)?;
            if confirm.value.as_ref() != status::TITLE_SET.as_bytes() {
                bail!("expected title-set, got {}", confirm.value_str());
            }
            chan.send(Param::VgexpandData, expand_opts)?;
            Ok(Peer::Session { version: theirs, title })
        }
        p if p == PURPOSE_DISPLAY.as_bytes() => {
            let theirs = expect(chan, Param::Version)?.value_str().into_owned();
            verdict(chan, &theirs, version)?;
            Ok(Peer::Display { version: theirs })
        }
        _ => bail!("unsupported purpose: {}", purpose.value_str()),
    }
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
