// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seermux: routes seer sessions to a single file-browser display.

pub mod config;
pub mod router;
pub mod state;

use crate::config::MuxConfig;
use crate::router::Router;

/// Run the router until the process is killed.
pub fn run(config: &MuxConfig) -> anyhow::Result<()> {
    let mut router = Router::bind(config)?;
    router.run()
}
