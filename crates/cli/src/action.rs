// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;
use std::fmt;

/// Outbound notification produced by a matcher effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Noop,
    SendCommand,
    SendPwd,
    SendLost,
    Up,
    Down,
    PageUp,
    PageDown,
    NewMask,
    Toggle,
    Refocus,
    Disable,
    Exit,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::SendCommand => "send-command",
            Self::SendPwd => "send-pwd",
            Self::SendLost => "send-lost",
            Self::Up => "up",
            Self::Down => "down",
            Self::PageUp => "pgup",
            Self::PageDown => "pgdown",
            Self::NewMask => "new-mask",
            Self::Toggle => "toggle",
            Self::Refocus => "refocus",
            Self::Disable => "disable",
            Self::Exit => "exit",
        }
    }

    /// The `order` value for actions forwarded as orders.
    pub fn order(&self) -> Option<&'static str> {
        match self {
            Self::Up | Self::Down | Self::PageUp | Self::PageDown | Self::Toggle | Self::Refocus => {
                Some(self.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coalescing, prioritised queue of pending actions.
///
/// Priority: exit > disable > send-lost > send-pwd > send-command > new-mask,
/// then navigation, toggle and refocus in arrival order. Each flagged action
/// is emitted at most once per drain.
#[derive(Debug, Default)]
pub struct ActionQueue {
    exit: bool,
    disable: bool,
    lost: bool,
    pwd: bool,
    command: bool,
    mask: bool,
    ordered: VecDeque<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        match action {
            Action::Noop => {}
            Action::Exit => self.exit = true,
            Action::Disable => self.disable = true,
            Action::SendLost => {
                self.lost = true;
                self.command = false;
            }
            Action::SendCommand => {
                self.command = true;
                self.lost = false;
            }
            Action::SendPwd => {
                self.pwd = true;
                self.command = false;
            }
            Action::NewMask => self.mask = true,
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Toggle
            | Action::Refocus => self.ordered.push_back(action),
        }
    }

    /// Next action by priority; `None` once the queue is drained.
    pub fn pop(&mut self) -> Option<Action> {
        let flags = [
            (&mut self.exit, Action::Exit),
            (&mut self.disable, Action::Disable),
            (&mut self.lost, Action::SendLost),
            (&mut self.pwd, Action::SendPwd),
            (&mut self.command, Action::SendCommand),
            (&mut self.mask, Action::NewMask),
        ];
        for (flag, action) in flags {
            if std::mem::take(flag) {
                return Some(action);
            }
        }
        self.ordered.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        !(self.exit || self.disable || self.lost || self.pwd || self.command || self.mask)
            && self.ordered.is_empty()
    }

    /// Drain everything in priority order.
    pub fn drain(&mut self) -> impl Iterator<Item = Action> + '_ {
        std::iter::from_fn(move || self.pop())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
