// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::time::Duration;

use clap::Parser;

use super::MuxConfig;

#[test]
fn defaults() -> anyhow::Result<()> {
    let config = MuxConfig::parse_from(["seermux", "--socket", "/tmp/seermux.sock"]);
    config.validate()?;
    assert_eq!(config.socket, Path::new("/tmp/seermux.sock"));
    assert_eq!(config.poll_interval(), Duration::from_secs(1));
    assert_eq!(config.expand_opts, "");
    Ok(())
}

#[test]
fn expand_opts_are_kept_verbatim() -> anyhow::Result<()> {
    let config = MuxConfig::parse_from([
        "seermux",
        "--socket",
        "/tmp/s",
        "--expand-opts",
        "-a --sort=name",
    ]);
    config.validate()?;
    assert_eq!(config.expand_opts, "-a --sort=name");
    Ok(())
}

#[yare::parameterized(
    zero_frame = { &["seermux", "--socket", "/tmp/s", "--max-frame", "0"], "--max-frame" },
    bad_format = { &["seermux", "--socket", "/tmp/s", "--log-format", "yaml"], "invalid log format" },
)]
fn invalid(args: &[&str], expected: &str) {
    let config = MuxConfig::parse_from(args);
    seer::assert_err_contains!(config.validate(), expected);
}
