// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};

use seer::config::{Config, LogFormat};

fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }

    match seer::session::run(&config) {
        Ok(status) => {
            info!(?status, "session finished");
            std::process::exit(status.code_or_signal());
        }
        Err(e) => {
            error!("fatal: {e:#}");
            eprintln!("seer: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Logs go to `--log-file` only. The terminal belongs to the shell, so
/// without a file nothing is installed and events are dropped.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file));

    match config.log_format()? {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
