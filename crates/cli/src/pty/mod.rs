// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod nbio;
pub mod raw;
pub mod spawn;

pub use nbio::PtyFd;
pub use raw::{terminal_size, RawModeGuard};
pub use spawn::{ExitStatus, ShellPty};
