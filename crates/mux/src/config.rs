// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use seer::config::LogFormat;
use seer::protocol::DEFAULT_MAX_FRAME;

/// Configuration for the seermux router.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "seermux", version, about = "Routes seer sessions to one display")]
pub struct MuxConfig {
    /// Unix socket to listen on. A stale socket file is replaced.
    #[arg(long, env = "SEERMUX_SOCKET")]
    pub socket: PathBuf,

    /// Largest frame accepted from or sent to any peer, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME, env = "SEERMUX_MAX_FRAME")]
    pub max_frame: usize,

    /// Readiness timeout between periodic checks, in ms.
    #[arg(long, default_value_t = 1000, env = "SEERMUX_POLL_MS")]
    pub poll_ms: u16,

    /// Options handed to every session for its expand tool.
    #[arg(long, default_value = "", env = "SEERMUX_EXPAND_OPTS")]
    pub expand_opts: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "SEERMUX_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text or json).
    #[arg(long, default_value = "text", env = "SEERMUX_LOG_FORMAT")]
    pub log_format: String,
}

impl MuxConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_frame == 0 {
            anyhow::bail!("--max-frame must be greater than zero");
        }
        if self.socket.as_os_str().is_empty() {
            anyhow::bail!("--socket must not be empty");
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> anyhow::Result<LogFormat> {
        self.log_format.parse()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_ms))
    }

    /// Defaults suitable for tests, listening on `socket`.
    pub fn test(socket: PathBuf) -> Self {
        Self {
            socket,
            max_frame: DEFAULT_MAX_FRAME,
            poll_ms: 50,
            expand_opts: "-a".to_owned(),
            log_level: "debug".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
