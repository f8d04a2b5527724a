// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan loop and effect handlers tying the matcher to the command-line model
//! and the action queue.

use tracing::{debug, info, warn};

use crate::action::{Action, ActionQueue};
use crate::buffer::SegmentedBuffer;
use crate::cmdline::CommandLine;
use crate::matcher::table::MARK_PREFIX;
use crate::matcher::{is_printable, Disposition, Effect, Mode, SequenceGroups, Status};
use crate::shell::ShellFlavor;

/// Keystrokes after which the shell's next newline means "run".
const ENDS_INPUT: &[u8] = &[b'\r', b'\n', 0x03, 0x04, b'\t', 0x0f];

/// How the scan loop continues after an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Apply the sequence's disposition to the whole segment.
    Whole,
    /// Pass all but the last `n` bytes; those are scanned again.
    Rescan(usize),
}

/// Interception state for one session.
#[derive(Debug)]
pub struct Engine {
    flavor: ShellFlavor,
    groups: SequenceGroups,
    cmdline: CommandLine,
    actions: ActionQueue,
    pwd: String,
    mask: String,
    expect_newline: bool,
    rprompt_cursor: usize,
    rprompt_done: bool,
    disabled: bool,
}

impl Engine {
    pub fn new(flavor: ShellFlavor) -> Self {
        Self {
            flavor,
            groups: SequenceGroups::new(flavor),
            cmdline: CommandLine::new(),
            actions: ActionQueue::new(),
            pwd: String::new(),
            mask: String::new(),
            expect_newline: false,
            rprompt_cursor: 0,
            rprompt_done: false,
            disabled: false,
        }
    }

    pub fn flavor(&self) -> ShellFlavor {
        self.flavor
    }

    pub fn cmdline(&self) -> &CommandLine {
        &self.cmdline
    }

    pub fn actions(&mut self) -> &mut ActionQueue {
        &mut self.actions
    }

    pub fn groups(&self) -> &SequenceGroups {
        &self.groups
    }

    pub fn pwd(&self) -> &str {
        &self.pwd
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    pub fn expect_newline(&self) -> bool {
        self.expect_newline
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Stop intercepting. Buffers are passed through untouched from now on.
    pub fn disable(&mut self) {
        if !self.disabled {
            info!("interception disabled");
        }
        self.disabled = true;
    }

    /// Record a terminal-input pass. The flag only reflects the latest pass.
    pub fn note_input(&mut self, input: &[u8]) {
        self.expect_newline = input.iter().any(|b| ENDS_INPUT.contains(b));
    }

    /// Scan everything pending in `buf`, applying effects as sequences match,
    /// and leave any unfinished match as a holdover.
    pub fn process(&mut self, buf: &mut SegmentedBuffer) {
        if self.disabled {
            buf.pass_all();
            return;
        }
        loop {
            let mode = buf.mode();
            let Some(byte) = buf.next_byte() else { break };
            let group = self.groups.get_mut(mode);
            if buf.seglen() == 1 {
                group.rearm();
            }
            let (status, hit) = group.feed(byte);
            if let Some(index) = hit {
                let seq = &group.sequences()[index];
                let (effect, disposition) = (seq.effect(), seq.disposition());
                group.reset();
                debug!(?effect, %mode, "sequence matched");
                match self.apply(effect, buf) {
                    Flow::Whole => match disposition {
                        Disposition::Eat => buf.eat_segment(),
                        Disposition::Pass => buf.pass_segment(),
                    },
                    Flow::Rescan(n) => buf.pass_partial(buf.seglen().saturating_sub(n)),
                }
            } else if status.contains(Status::IN_PROGRESS) {
                continue;
            } else if buf.seglen() == 1 {
                self.fallback(mode, byte);
                buf.pass_segment();
            } else {
                buf.pass_partial(buf.seglen() - 1);
            }
        }

        if !buf.is_mid_match() {
            return;
        }
        let mode = buf.mode();
        if buf.segment_was_carried() {
            warn!(%mode, len = buf.seglen(), "partial match outlived its holdover, releasing");
            self.groups.get_mut(mode).reset();
            buf.pass_segment();
            if mode == Mode::Prompt {
                self.lost(buf);
            }
            return;
        }
        let write_now = !self.groups.get(mode).holds_eat();
        self.groups.get_mut(mode).reset();
        buf.create_holdover(write_now);
    }

    /// Unmatched single byte.
    fn fallback(&mut self, mode: Mode, byte: u8) {
        if mode == Mode::Prompt && is_printable(byte) {
            self.cmdline.overwrite(byte, true);
            self.changed();
        }
    }

    fn apply(&mut self, effect: Effect, buf: &mut SegmentedBuffer) -> Flow {
        match effect {
            Effect::Ignore => {}
            Effect::NavUp => self.actions.push(Action::Up),
            Effect::NavDown => self.actions.push(Action::Down),
            Effect::NavPageUp => self.actions.push(Action::PageUp),
            Effect::NavPageDown => self.actions.push(Action::PageDown),
            Effect::Toggle => self.actions.push(Action::Toggle),
            Effect::Refocus => self.actions.push(Action::Refocus),
            Effect::Pwd => self.update_pwd(buf.segment()),
            Effect::PromptEnd => {
                if buf.mode() == Mode::Prompt {
                    self.cmdline.rebuild();
                } else {
                    info!(from = %buf.mode(), "prompt reached");
                    buf.set_mode(Mode::Prompt);
                    self.cmdline.clear();
                    self.mask.clear();
                    self.expect_newline = false;
                    self.rprompt_done = false;
                    self.actions.push(Action::SendCommand);
                }
            }
            Effect::Continuation => {
                buf.set_mode(Mode::Prompt);
                self.cmdline.rebuild();
                self.actions.push(Action::SendCommand);
            }
            Effect::RightPromptEnd => self.rprompt_done = true,
            Effect::RightPromptReturn => {
                if self.rprompt_done {
                    self.leave_right_prompt(buf);
                }
            }
            Effect::Newline => {
                if self.expect_newline {
                    self.executed(buf);
                } else {
                    if buf.mode() == Mode::RightPrompt {
                        self.leave_right_prompt(buf);
                    }
                    self.cmdline.wrap();
                }
            }
            Effect::CarriageReturn => {
                if self.expect_newline {
                    self.executed(buf);
                } else {
                    self.cmdline.carriage_return();
                }
                return Flow::Rescan(1);
            }
            Effect::Backspace => {
                self.cmdline.backward(1);
                self.refresh_mask();
            }
            Effect::CursorForward => self.cursor_forward(buf),
            Effect::CursorBackward => {
                self.cmdline.backward(count(buf.segment()));
                self.refresh_mask();
            }
            Effect::CursorUp => {
                if !self.cmdline.up(count(buf.segment())) {
                    self.lost(buf);
                }
            }
            Effect::Lost => self.lost(buf),
            Effect::EraseLine => {
                match param(buf.segment()) {
                    1 => self.cmdline.erase_left(),
                    2 => self.cmdline.erase_row(),
                    _ => self.cmdline.erase_right(),
                }
                self.changed();
            }
            Effect::EraseBelow => match param(buf.segment()) {
                0 => {
                    self.cmdline.truncate();
                    self.changed();
                }
                2 => self.cmdline.rebuild(),
                _ => {}
            },
            Effect::DeleteChars => {
                self.cmdline.delete(count(buf.segment()));
                self.changed();
            }
            Effect::InsertBlanks => {
                self.cmdline.insert(count(buf.segment()));
                self.changed();
            }
        }
        Flow::Whole
    }

    fn update_pwd(&mut self, segment: &[u8]) {
        let start = MARK_PREFIX.len() + 1;
        let Some(body) = segment.get(start..segment.len().saturating_sub(1)) else {
            return;
        };
        let pwd = String::from_utf8_lossy(body).into_owned();
        if pwd != self.pwd {
            debug!(%pwd, "directory changed");
            self.pwd = pwd;
            self.actions.push(Action::SendPwd);
        }
    }

    fn cursor_forward(&mut self, buf: &mut SegmentedBuffer) {
        let before = self.cmdline.cursor();
        let overflow = self.cmdline.forward(count(buf.segment()));
        if overflow == 0 {
            self.refresh_mask();
            return;
        }
        match self.flavor {
            ShellFlavor::Bash => self.executed(buf),
            ShellFlavor::Zsh if overflow == 1 => {
                self.cmdline.insert_blank();
                self.changed();
            }
            ShellFlavor::Zsh => {
                debug!(overflow, "right prompt start");
                self.rprompt_cursor = before;
                self.rprompt_done = false;
                buf.set_mode(Mode::RightPrompt);
            }
        }
    }

    fn leave_right_prompt(&mut self, buf: &mut SegmentedBuffer) {
        buf.set_mode(Mode::Prompt);
        self.rprompt_done = false;
        let target = self.rprompt_cursor.min(self.cmdline.len());
        let current = self.cmdline.cursor();
        if target < current {
            self.cmdline.backward(current - target);
        } else {
            self.cmdline.forward(target - current);
        }
    }

    fn executed(&mut self, buf: &mut SegmentedBuffer) {
        info!(cmd = %self.cmdline.text(), "command executed");
        buf.set_mode(Mode::Executing);
        self.expect_newline = false;
        self.cmdline.trim_wraps();
        self.actions.push(Action::SendCommand);
    }

    fn lost(&mut self, buf: &mut SegmentedBuffer) {
        warn!(mode = %buf.mode(), "lost track of the command line");
        buf.set_mode(Mode::Executing);
        self.actions.push(Action::SendLost);
    }

    /// The line changed: resend it and the mask if the word under the cursor
    /// moved.
    fn changed(&mut self) {
        self.actions.push(Action::SendCommand);
        self.refresh_mask();
    }

    fn refresh_mask(&mut self) {
        let word = self.cmdline.word_at_cursor();
        if word != self.mask {
            self.mask = word;
            self.actions.push(Action::NewMask);
        }
    }
}

/// First numeric parameter of a CSI segment, or 0 when absent.
fn param(segment: &[u8]) -> usize {
    segment
        .iter()
        .skip_while(|b| !b.is_ascii_digit())
        .take_while(|b| b.is_ascii_digit())
        .fold(0usize, |acc, b| acc.saturating_mul(10).saturating_add(usize::from(b - b'0')))
}

/// Repeat count of a CSI segment: a missing or zero parameter means one.
fn count(segment: &[u8]) -> usize {
    param(segment).max(1)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
