// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translation between engine actions and router frames, extracted from the
//! session loop.
//!
//! Neither function touches a descriptor: each looks at the engine and the
//! frame or action it is given and says what the loop should do.

use crate::action::Action;
use crate::engine::Engine;
use crate::protocol::{order, status, Frame, Param};
use crate::sanitize::shell_quote;

/// Frame to send for `action`, if any.
///
/// `at_prompt` decides what `send-command` means: the line being typed, or
/// notice that a command is running.
pub fn outbound(action: Action, engine: &Engine, at_prompt: bool) -> Option<(Param, String)> {
    let frame = match action {
        Action::Noop => return None,
        Action::SendCommand if at_prompt => (Param::Cmd, engine.cmdline().text()),
        Action::SendCommand => (Param::Status, status::EXECUTING.to_owned()),
        Action::SendPwd => (Param::Pwd, engine.pwd().to_owned()),
        Action::SendLost => (Param::Status, status::LOST.to_owned()),
        Action::NewMask => (Param::DevelopingMask, engine.mask().to_owned()),
        Action::Disable => (Param::Status, status::ERROR.to_owned()),
        Action::Exit => (Param::Status, status::DEAD.to_owned()),
        Action::Up
        | Action::Down
        | Action::PageUp
        | Action::PageDown
        | Action::Toggle
        | Action::Refocus => (Param::Order, action.order()?.to_owned()),
    };
    Some(frame)
}

/// What the loop does with a frame from the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Write these bytes to the shell as if typed.
    Inject(Vec<u8>),
    Ignore,
    /// The router closed the connection.
    RouterGone,
    /// The frame makes no sense here; stop intercepting.
    Desync,
}

/// Decide what to do with `frame`. Injected bytes count as terminal input,
/// so the engine sees an Enter sent by the display the same as a typed one.
pub fn inbound(frame: &Frame, engine: &mut Engine) -> Inbound {
    let inbound = match frame.param {
        Param::File => {
            let mut bytes = shell_quote(&frame.value_str()).into_bytes();
            bytes.push(b' ');
            Inbound::Inject(bytes)
        }
        Param::Key => Inbound::Inject(frame.value.to_vec()),
        Param::Order if frame.value.as_ref() == order::REFOCUS.as_bytes() => Inbound::Ignore,
        Param::Eof => Inbound::RouterGone,
        _ => Inbound::Desync,
    };
    if let Inbound::Inject(bytes) = &inbound {
        engine.note_input(bytes);
    }
    inbound
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
