// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::ffi::CString;
use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{kill, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, Pid};
use tracing::{debug, info};

use super::nbio::PtyFd;

/// How a shell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Exit code to report for this status, following the shell convention
    /// of 128 + signal number.
    pub fn code_or_signal(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(sig)) => 128 + sig,
            (None, None) => 1,
        }
    }
}

/// The user's shell running on a fresh PTY.
#[derive(Debug)]
pub struct ShellPty {
    master: PtyFd,
    child_pid: Pid,
    reaped: Option<ExitStatus>,
    reap_interval: Duration,
}

impl ShellPty {
    /// Spawn `argv` on a new PTY sized `cols` x `rows`.
    ///
    /// `argv` must have at least one element (the program to run).
    /// `extra_env` sets additional environment variables in the child.
    // forkpty requires unsafe: post-fork child is partially initialized
    #[allow(unsafe_code)]
    pub fn spawn(
        argv: &[String],
        cols: u16,
        rows: u16,
        extra_env: &[(String, String)],
    ) -> anyhow::Result<Self> {
        let c_args: Vec<CString> = argv
            .iter()
            .map(|s| CString::new(s.as_bytes()))
            .collect::<Result<_, _>>()
            .context("invalid shell argument")?;
        let Some(program) = c_args.first() else {
            bail!("no shell to run");
        };
        let winsize = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };

        // SAFETY: forkpty is unsafe because the child is in a
        // partially-initialized state after fork. We immediately exec.
        let result = unsafe { forkpty(&winsize, None) }.context("forkpty failed")?;

        match result {
            ForkptyResult::Child => {
                // SAFETY: restoring the default SIGPIPE disposition in the
                // post-fork child before exec.
                unsafe {
                    let _ = nix::sys::signal::signal(Signal::SIGPIPE, SigHandler::SigDfl);
                }
                std::env::set_var("SEER", "1");
                for (key, val) in extra_env {
                    std::env::set_var(key, val);
                }
                let err = match execvp(program, &c_args) {
                    Ok(never) => match never {},
                    Err(e) => e,
                };
                // Never return into the parent's code path from the child.
                let _ = writeln!(std::io::stderr(), "seer: exec {}: {err}", argv[0]);
                std::process::exit(127);
            }
            ForkptyResult::Parent { child, master } => {
                info!(pid = child.as_raw(), shell = %argv[0], "shell started");
                Ok(Self {
                    master: PtyFd::new(master).context("pty master non-blocking")?,
                    child_pid: child,
                    reaped: None,
                    reap_interval: Duration::from_millis(50),
                })
            }
        }
    }

    pub fn master(&self) -> &PtyFd {
        &self.master
    }

    pub fn child_pid(&self) -> u32 {
        self.child_pid.as_raw() as u32
    }

    pub fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let ws =
            rustix::termios::Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };
        rustix::termios::tcsetwinsize(&self.master, ws).context("TIOCSWINSZ ioctl failed")?;
        Ok(())
    }

    /// Block until the shell exits.
    pub fn wait(&mut self) -> anyhow::Result<ExitStatus> {
        if let Some(status) = self.reaped {
            return Ok(status);
        }
        loop {
            let status = match waitpid(self.child_pid, None) {
                Ok(WaitStatus::Exited(_, code)) => ExitStatus { code: Some(code), signal: None },
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    ExitStatus { code: None, signal: Some(sig as i32) }
                }
                Ok(_) => continue,
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => bail!("waitpid failed: {e}"),
            };
            debug!(?status, "shell reaped");
            self.reaped = Some(status);
            return Ok(status);
        }
    }
}

impl Drop for ShellPty {
    fn drop(&mut self) {
        if self.reaped.is_some() {
            return;
        }
        // forkpty places the child in a new session (setsid), so the child PID
        // equals the process group ID. Signal the entire group to clean up
        // grandchildren as well.
        let pgid = Pid::from_raw(-self.child_pid.as_raw());
        let _ = kill(pgid, Signal::SIGHUP);

        // Poll for exit up to 500ms before escalating to SIGKILL.
        let iterations = (500 / self.reap_interval.as_millis().max(1)) as usize;
        for _ in 0..iterations.max(1) {
            match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => return,
                _ => std::thread::sleep(self.reap_interval),
            }
        }

        let _ = kill(pgid, Signal::SIGKILL);
        let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
