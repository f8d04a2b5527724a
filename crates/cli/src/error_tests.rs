// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    transport        = { ErrorKind::Transport, true },
    desync           = { ErrorKind::Desync, false },
    malformed        = { ErrorKind::Malformed, false },
    partial_match    = { ErrorKind::PartialMatch, false },
    version_mismatch = { ErrorKind::VersionMismatch, false },
)]
fn fatality(kind: ErrorKind, fatal: bool) {
    assert_eq!(kind.is_fatal(), fatal);
}

#[test]
fn display_matches_as_str() {
    assert_eq!(ErrorKind::VersionMismatch.to_string(), "VERSION_MISMATCH");
    assert_eq!(ErrorKind::Desync.to_string(), ErrorKind::Desync.as_str());
}
