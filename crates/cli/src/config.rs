// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::protocol::DEFAULT_MAX_FRAME;
use crate::shell::ShellFlavor;

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("invalid log format: {other}"),
        }
    }
}

/// Shell wrapper that mirrors the command line to a file-browser display.
#[derive(Debug, Parser)]
#[command(name = "seer", version, about)]
pub struct Config {
    /// Router socket path. Without it the shell runs unobserved.
    #[arg(long, env = "SEER_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Shell program to run.
    #[arg(long, env = "SHELL", default_value = "/bin/bash")]
    pub shell: String,

    /// Prompt conventions to expect (bash or zsh). Inferred from --shell.
    #[arg(long, env = "SEER_FLAVOR")]
    pub flavor: Option<String>,

    /// Program run in the sandbox to expand globs.
    #[arg(long, env = "SEER_EXPAND_TOOL", default_value = "vgexpand")]
    pub expand_tool: String,

    /// Largest frame accepted from or sent to the router, in bytes.
    #[arg(long, env = "SEER_MAX_FRAME", default_value_t = DEFAULT_MAX_FRAME)]
    pub max_frame: usize,

    /// Readiness timeout between periodic checks, in ms.
    #[arg(long, env = "SEER_POLL_MS", default_value = "250")]
    pub poll_ms: u16,

    /// Write logs here. The terminal itself never receives log output.
    #[arg(long, env = "SEER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "SEER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (text or json).
    #[arg(long, env = "SEER_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_frame == 0 {
            anyhow::bail!("--max-frame must be greater than zero");
        }
        if self.shell.is_empty() {
            anyhow::bail!("--shell must not be empty");
        }
        self.flavor()?;
        self.log_format()?;
        Ok(())
    }

    /// Explicit `--flavor`, else inferred from the shell's file name.
    pub fn flavor(&self) -> anyhow::Result<ShellFlavor> {
        match &self.flavor {
            Some(name) => name.parse(),
            None => ShellFlavor::from_program(&self.shell).ok_or_else(|| {
                anyhow::anyhow!("cannot infer flavor from shell {}; pass --flavor", self.shell)
            }),
        }
    }

    pub fn log_format(&self) -> anyhow::Result<LogFormat> {
        self.log_format.parse()
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_ms))
    }

    /// Defaults suitable for tests: bash, no router.
    pub fn test() -> Self {
        Self {
            socket: None,
            shell: "/bin/bash".to_owned(),
            flavor: None,
            expand_tool: "vgexpand".to_owned(),
            max_frame: DEFAULT_MAX_FRAME,
            poll_ms: 250,
            log_file: None,
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
