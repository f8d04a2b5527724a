// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wildcard escape-sequence matcher.
//!
//! Every [`Sequence`] in the active [`SequenceGroup`] is stepped once per
//! byte. The first sequence to complete (in table order) wins; its effect is
//! applied by the engine and the whole group is reset.

pub mod table;

use bitflags::bitflags;

use crate::shell::ShellFlavor;

pub use table::Effect;

/// What the engine believes the bytes arriving on a buffer represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keystrokes travelling from the user's terminal to the shell.
    Term,
    /// Shell output while a command runs.
    Executing,
    /// Shell output while the line editor owns the screen.
    Prompt,
    /// Shell output while zsh draws its right prompt.
    RightPrompt,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Executing => "executing",
            Self::Prompt => "prompt",
            Self::RightPrompt => "right-prompt",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One position in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Byte(u8),
    /// Zero or more ASCII digits, ended by the literal that follows.
    Digits,
    /// Zero or more printable bytes, ended by the literal that follows.
    Printables,
    /// Exactly one byte that is not LF.
    NotLf,
    /// Exactly one byte that is neither LF nor CR.
    NotLfCr,
}

impl Symbol {
    fn is_run(&self) -> bool {
        matches!(self, Self::Digits | Self::Printables)
    }

    fn admits(&self, byte: u8) -> bool {
        match self {
            Self::Byte(b) => *b == byte,
            Self::Digits => byte.is_ascii_digit(),
            Self::Printables => is_printable(byte),
            Self::NotLf => byte != b'\n',
            Self::NotLfCr => byte != b'\n' && byte != b'\r',
        }
    }
}

/// Printable for matching purposes: anything but C0 controls and DEL, so
/// UTF-8 sequences count.
pub fn is_printable(byte: u8) -> bool {
    byte >= 0x20 && byte != 0x7f
}

/// Compile a compact pattern: `%d` digits, `%p` printables, `%n` not-LF,
/// `%r` not-LF-not-CR, `%%` a literal percent sign.
pub fn compile(spec: &[u8]) -> Vec<Symbol> {
    let mut out = Vec::with_capacity(spec.len());
    let mut iter = spec.iter().copied();
    while let Some(b) = iter.next() {
        if b != b'%' {
            out.push(Symbol::Byte(b));
            continue;
        }
        match iter.next() {
            Some(b'd') => out.push(Symbol::Digits),
            Some(b'p') => out.push(Symbol::Printables),
            Some(b'n') => out.push(Symbol::NotLf),
            Some(b'r') => out.push(Symbol::NotLfCr),
            Some(other) => out.push(Symbol::Byte(other)),
            None => out.push(Symbol::Byte(b'%')),
        }
    }
    out
}

bitflags! {
    /// Aggregate result of feeding one byte to a group.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const NO_MATCH = 0b001;
        const IN_PROGRESS = 0b010;
        const MATCH = 0b100;
    }
}

/// What happens to a matched segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward unchanged.
    Pass,
    /// Remove before it reaches the other side.
    Eat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Fail,
    Partial,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pattern: Vec<Symbol>,
    cursor: usize,
    enabled: bool,
    effect: Effect,
    disposition: Disposition,
}

impl Sequence {
    pub fn new(spec: &[u8], effect: Effect, disposition: Disposition) -> Self {
        Self { pattern: compile(spec), cursor: 0, enabled: true, effect, disposition }
    }

    pub fn pattern(&self) -> &[Symbol] {
        &self.pattern
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Every run wildcard is followed by a literal it cannot itself consume.
    pub fn is_well_formed(&self) -> bool {
        self.pattern.iter().enumerate().all(|(i, sym)| {
            if !sym.is_run() {
                return true;
            }
            match self.pattern.get(i + 1) {
                Some(Symbol::Byte(t)) => !sym.admits(*t),
                _ => false,
            }
        })
    }

    fn step(&mut self, byte: u8) -> Step {
        let Some(sym) = self.pattern.get(self.cursor).copied() else {
            return Step::Fail;
        };
        let advanced = match sym {
            Symbol::Digits | Symbol::Printables => {
                if sym.admits(byte) {
                    return Step::Partial;
                }
                match self.pattern.get(self.cursor + 1) {
                    Some(Symbol::Byte(t)) if *t == byte => {
                        self.cursor += 2;
                        true
                    }
                    _ => false,
                }
            }
            _ => {
                if sym.admits(byte) {
                    self.cursor += 1;
                    true
                } else {
                    false
                }
            }
        };
        if !advanced {
            return Step::Fail;
        }
        if self.cursor >= self.pattern.len() {
            Step::Complete
        } else {
            Step::Partial
        }
    }
}

/// The ordered sequences active for one mode.
#[derive(Debug, Clone)]
pub struct SequenceGroup {
    sequences: Vec<Sequence>,
}

impl SequenceGroup {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self { sequences }
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Re-enable every sequence with its cursor at the start.
    pub fn rearm(&mut self) {
        for seq in &mut self.sequences {
            seq.cursor = 0;
            seq.enabled = true;
        }
    }

    /// Reset after a match: all cursors to zero, all sequences disabled until
    /// the next [`rearm`](Self::rearm).
    pub fn reset(&mut self) {
        for seq in &mut self.sequences {
            seq.cursor = 0;
            seq.enabled = false;
        }
    }

    /// Step every enabled sequence with `byte`. Returns the aggregate status
    /// and the index of the sequence that completed, if any.
    pub fn feed(&mut self, byte: u8) -> (Status, Option<usize>) {
        let mut status = Status::empty();
        for (i, seq) in self.sequences.iter_mut().enumerate() {
            if !seq.enabled {
                continue;
            }
            match seq.step(byte) {
                Step::Fail => {
                    seq.cursor = 0;
                    seq.enabled = false;
                    status |= Status::NO_MATCH;
                }
                Step::Partial => status |= Status::IN_PROGRESS,
                Step::Complete => {
                    status |= Status::MATCH;
                    return (status, Some(i));
                }
            }
        }
        if status.is_empty() {
            status = Status::NO_MATCH;
        }
        (status, None)
    }

    /// Whether a sequence that would swallow its bytes is still in progress.
    pub fn holds_eat(&self) -> bool {
        self.sequences.iter().any(|s| {
            s.enabled
                && s.disposition == Disposition::Eat
                && (s.cursor > 0 || matches!(s.pattern.first(), Some(sym) if sym.is_run()))
        })
    }
}

/// The per-mode groups for one session, built once from the flavor's table.
#[derive(Debug, Clone)]
pub struct SequenceGroups {
    term: SequenceGroup,
    executing: SequenceGroup,
    prompt: SequenceGroup,
    right_prompt: SequenceGroup,
}

impl SequenceGroups {
    pub fn new(flavor: ShellFlavor) -> Self {
        Self {
            term: SequenceGroup::new(table::build(flavor, Mode::Term)),
            executing: SequenceGroup::new(table::build(flavor, Mode::Executing)),
            prompt: SequenceGroup::new(table::build(flavor, Mode::Prompt)),
            right_prompt: SequenceGroup::new(table::build(flavor, Mode::RightPrompt)),
        }
    }

    pub fn get(&self, mode: Mode) -> &SequenceGroup {
        match mode {
            Mode::Term => &self.term,
            Mode::Executing => &self.executing,
            Mode::Prompt => &self.prompt,
            Mode::RightPrompt => &self.right_prompt,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut SequenceGroup {
        match mode {
            Mode::Term => &mut self.term,
            Mode::Executing => &mut self.executing,
            Mode::Prompt => &mut self.prompt,
            Mode::RightPrompt => &mut self.right_prompt,
        }
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
