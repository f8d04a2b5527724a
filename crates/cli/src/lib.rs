// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod action;
pub mod buffer;
pub mod cmdline;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod protocol;
pub mod pty;
pub mod sandbox;
pub mod sanitize;
pub mod session;
pub mod shell;
pub mod test_support;
