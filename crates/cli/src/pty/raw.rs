// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user's terminal: raw mode and window size.

use std::os::fd::AsFd;
use std::sync::{Mutex, Once};

use nix::sys::termios::{self, SetArg, Termios};

/// Terminal attributes to restore from the panic hook.
static PANIC_TERMIOS: Mutex<Option<Termios>> = Mutex::new(None);
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Keeps stdin in raw mode for as long as it lives.
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    pub fn enter() -> anyhow::Result<Self> {
        let stdin = std::io::stdin();
        let original = termios::tcgetattr(stdin.as_fd())?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSAFLUSH, &raw)?;

        if let Ok(mut guard) = PANIC_TERMIOS.lock() {
            *guard = Some(original.clone());
        }
        PANIC_HOOK_INSTALLED.call_once(|| {
            let prev_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                if let Ok(guard) = PANIC_TERMIOS.lock() {
                    if let Some(ref saved) = *guard {
                        let stdin = std::io::stdin();
                        let _ = termios::tcsetattr(stdin.as_fd(), SetArg::TCSAFLUSH, saved);
                    }
                }
                prev_hook(info);
            }));
        });
        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Clear the panic hook's termios state; we're restoring normally.
        if let Ok(mut guard) = PANIC_TERMIOS.lock() {
            *guard = None;
        }
        let stdin = std::io::stdin();
        let _ = termios::tcsetattr(stdin.as_fd(), SetArg::TCSAFLUSH, &self.original);
    }
}

/// Columns and rows of `fd`, if it is a terminal with a known size.
pub fn terminal_size(fd: impl AsFd) -> Option<(u16, u16)> {
    let ws = rustix::termios::tcgetwinsize(fd).ok()?;
    (ws.ws_col > 0 && ws.ws_row > 0).then_some((ws.ws_col, ws.ws_row))
}

/// Whether `fd` refers to a terminal.
pub fn is_terminal(fd: impl AsFd) -> bool {
    rustix::termios::isatty(fd)
}
