// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern tables per shell flavor and mode.
//!
//! Order matters: when two entries could complete on the same byte, the one
//! listed first wins.

use super::Disposition::{self, Eat, Pass};
use super::{Mode, Sequence};
use crate::shell::ShellFlavor;

/// Prefix shared by the private OSC markers injected into the prompts.
pub const MARK_PREFIX: &[u8] = b"\x1b]6973;";
/// `OSC 6973;D <path> BEL`, first thing in PS1.
pub const PWD_MARK: &[u8] = b"\x1b]6973;D%p\x07";
/// `OSC 6973;P BEL`, last thing in PS1.
pub const PROMPT_MARK: &[u8] = b"\x1b]6973;P\x07";
/// `OSC 6973;C BEL`, last thing in PS2.
pub const CONTINUATION_MARK: &[u8] = b"\x1b]6973;C\x07";
/// `OSC 6973;R BEL`, last thing in zsh's RPROMPT.
pub const RPROMPT_MARK: &[u8] = b"\x1b]6973;R\x07";

/// What a completed sequence does. Applied by [`crate::engine::Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Recognised so it is not mistaken for text; nothing else happens.
    Ignore,
    NavUp,
    NavDown,
    NavPageUp,
    NavPageDown,
    Toggle,
    Refocus,
    Pwd,
    PromptEnd,
    Continuation,
    RightPromptEnd,
    RightPromptReturn,
    Newline,
    CarriageReturn,
    Backspace,
    CursorForward,
    CursorBackward,
    CursorUp,
    Lost,
    EraseLine,
    EraseBelow,
    DeleteChars,
    InsertBlanks,
}

type Entry = (&'static [u8], Effect, Disposition);

const TERM: &[Entry] = &[
    (b"\x07k", Effect::NavUp, Eat),
    (b"\x07j", Effect::NavDown, Eat),
    (b"\x07u", Effect::NavPageUp, Eat),
    (b"\x07d", Effect::NavPageDown, Eat),
    (b"\x07t", Effect::Toggle, Eat),
    (b"\x07r", Effect::Refocus, Eat),
];

const EXECUTING: &[Entry] = &[
    (PWD_MARK, Effect::Pwd, Eat),
    (PROMPT_MARK, Effect::PromptEnd, Eat),
    (CONTINUATION_MARK, Effect::Continuation, Eat),
];

const RIGHT_PROMPT: &[Entry] = &[
    (RPROMPT_MARK, Effect::RightPromptEnd, Eat),
    (PROMPT_MARK, Effect::PromptEnd, Eat),
    (PWD_MARK, Effect::Pwd, Eat),
    (b"\x1b[%dD", Effect::RightPromptReturn, Pass),
    (b"\r\n", Effect::Newline, Pass),
];

/// Prompt entries ahead of the carriage-return entry.
const PROMPT_HEAD: &[Entry] = &[
    (PWD_MARK, Effect::Pwd, Eat),
    (PROMPT_MARK, Effect::PromptEnd, Eat),
    (CONTINUATION_MARK, Effect::Continuation, Eat),
    (b"\r\n", Effect::Newline, Pass),
    (b"\n", Effect::Newline, Pass),
];

const BASH_CR: Entry = (b"\r%n", Effect::CarriageReturn, Pass);
// zsh writes CR CR LF on accept-line; excluding CR lets the pair collapse.
const ZSH_CR: Entry = (b"\r%r", Effect::CarriageReturn, Pass);

const PROMPT_TAIL: &[Entry] = &[
    (b"\x08", Effect::Backspace, Pass),
    (b"\x1b[%dC", Effect::CursorForward, Pass),
    (b"\x1b[%dD", Effect::CursorBackward, Pass),
    (b"\x1b[%dA", Effect::CursorUp, Pass),
    (b"\x1b[%dB", Effect::Lost, Pass),
    (b"\x1b[%dK", Effect::EraseLine, Pass),
    (b"\x1b[%dJ", Effect::EraseBelow, Pass),
    (b"\x1b[%dP", Effect::DeleteChars, Pass),
    (b"\x1b[%d@", Effect::InsertBlanks, Pass),
    (b"\x1b[%d;%dH", Effect::Lost, Pass),
    (b"\x1b[?%dh", Effect::Ignore, Pass),
    (b"\x1b[?%dl", Effect::Ignore, Pass),
    (b"\x1b[%dm", Effect::Ignore, Pass),
    (b"\x1b[%d;%dm", Effect::Ignore, Pass),
    (b"\x1b[%d;%d;%dm", Effect::Ignore, Pass),
    (b"\x1b]0;%p\x07", Effect::Ignore, Pass),
    (b"\x1b]2;%p\x07", Effect::Ignore, Pass),
    (b"\x1b]0;%p\x1b\\", Effect::Ignore, Pass),
    (b"\x1b]2;%p\x1b\\", Effect::Ignore, Pass),
    (b"\x07", Effect::Ignore, Pass),
];

fn entries(flavor: ShellFlavor, mode: Mode) -> Vec<Entry> {
    match mode {
        Mode::Term => TERM.to_vec(),
        Mode::Executing => EXECUTING.to_vec(),
        Mode::RightPrompt => RIGHT_PROMPT.to_vec(),
        Mode::Prompt => {
            let cr = match flavor {
                ShellFlavor::Bash => BASH_CR,
                ShellFlavor::Zsh => ZSH_CR,
            };
            let mut out = PROMPT_HEAD.to_vec();
            out.push(cr);
            out.extend_from_slice(PROMPT_TAIL);
            out
        }
    }
}

/// Build the ordered sequences for one flavor and mode.
pub fn build(flavor: ShellFlavor, mode: Mode) -> Vec<Sequence> {
    entries(flavor, mode)
        .into_iter()
        .map(|(spec, effect, disposition)| Sequence::new(spec, effect, disposition))
        .collect()
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
