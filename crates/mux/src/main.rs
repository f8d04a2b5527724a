// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use seer::config::LogFormat;
use seermux::config::MuxConfig;

fn main() {
    let config = MuxConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match config.log_format() {
        Ok(LogFormat::Json) => builder.json().init(),
        _ => builder.init(),
    }

    if let Err(e) = seermux::run(&config) {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
