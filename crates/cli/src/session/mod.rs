// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session loop: the user's shell on a PTY, observed by the engine and
//! mirrored to the router.

use std::fs::File;
use std::os::fd::AsFd;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::pty::{raw, ExitStatus, RawModeGuard, ShellPty};
use crate::shell::ShellLaunch;

pub mod run;
pub mod transition;

pub use run::Session;

/// Unbuffered handles on the user's terminal.
///
/// Duplicated from stdin/stdout so no userspace buffer sits between the
/// readiness wait and the read.
#[derive(Debug)]
pub struct Terminal {
    pub input: File,
    pub output: File,
}

impl Terminal {
    pub fn open() -> anyhow::Result<Self> {
        let input = std::io::stdin().as_fd().try_clone_to_owned().context("dup stdin")?;
        let output = std::io::stdout().as_fd().try_clone_to_owned().context("dup stdout")?;
        Ok(Self { input: File::from(input), output: File::from(output) })
    }

    pub fn size(&self) -> Option<(u16, u16)> {
        raw::terminal_size(&self.output)
    }

    pub fn is_terminal(&self) -> bool {
        raw::is_terminal(&self.input)
    }
}

/// Run one interactive session to completion.
///
/// The terminal is back in its original mode by the time this returns.
pub fn run(config: &Config) -> anyhow::Result<ExitStatus> {
    let flavor = config.flavor()?;
    let launch = ShellLaunch::prepare(flavor, &config.shell)?;
    let term = Terminal::open()?;
    let (cols, rows) = term.size().unwrap_or((80, 24));
    let pty = ShellPty::spawn(&launch.argv, cols, rows, &launch.env)?;
    info!(%flavor, cols, rows, "session starting");

    let _raw = if term.is_terminal() { Some(RawModeGuard::enter()?) } else { None };
    let mut session = Session::new(config, flavor, pty, term);
    session.connect();
    session.run()
}
