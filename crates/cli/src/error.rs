// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Failure classes a session distinguishes when deciding whether to carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Read or write failed on a required descriptor.
    Transport,
    /// A frame named a parameter that makes no sense here.
    Desync,
    /// A frame could not be decoded.
    Malformed,
    /// A match was still open when the data ran out.
    PartialMatch,
    /// The peer runs a different version.
    VersionMismatch,
}

impl ErrorKind {
    /// Fatal errors end the session; the rest degrade it to pass-through.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT",
            Self::Desync => "DESYNC",
            Self::Malformed => "MALFORMED",
            Self::PartialMatch => "PARTIAL_MATCH",
            Self::VersionMismatch => "VERSION_MISMATCH",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
