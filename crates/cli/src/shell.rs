// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell flavors and the rc files that inject the prompt markers.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use tempfile::TempDir;

/// Supported shells. Each has its own prompt conventions and pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellFlavor {
    Bash,
    Zsh,
}

impl ShellFlavor {
    /// Infer the flavor from a shell program path (`/usr/bin/zsh` -> Zsh).
    pub fn from_program(program: &str) -> Option<Self> {
        let name = Path::new(program).file_name()?.to_str()?;
        let name = name.trim_start_matches('-');
        if name.starts_with("zsh") {
            Some(Self::Zsh)
        } else if name.starts_with("bash") || name == "sh" {
            Some(Self::Bash)
        } else {
            None
        }
    }
}

impl fmt::Display for ShellFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bash => f.write_str("bash"),
            Self::Zsh => f.write_str("zsh"),
        }
    }
}

impl std::str::FromStr for ShellFlavor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            other => anyhow::bail!("unsupported shell flavor: {other}"),
        }
    }
}

const BASH_RC: &str = r#"[ -f "$HOME/.bashrc" ] && . "$HOME/.bashrc"
PS1='\[\e]6973;D${PWD}\a\]'"${PS1}"'\[\e]6973;P\a\]'
PS2="${PS2}"'\[\e]6973;C\a\]'
"#;

const ZSH_ENV: &str = r#"[ -f "$HOME/.zshenv" ] && . "$HOME/.zshenv"
"#;

const ZSH_RC: &str = r#"[ -f "$HOME/.zshrc" ] && . "$HOME/.zshrc"
PS1=$'%{\e]6973;D'%d$'\a%}'"${PS1}"$'%{\e]6973;P\a%}'
PS2="${PS2}"$'%{\e]6973;C\a%}'
RPROMPT="${RPROMPT}"$'%{\e]6973;R\a%}'
"#;

/// Everything needed to exec the user's shell with markers in its prompts.
///
/// Holds the temporary rc directory; it must outlive the shell's startup.
#[derive(Debug)]
pub struct ShellLaunch {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    _rc_dir: TempDir,
}

impl ShellLaunch {
    pub fn prepare(flavor: ShellFlavor, program: &str) -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("seer-rc-")
            .tempdir()
            .context("create rc directory")?;
        let (argv, env) = match flavor {
            ShellFlavor::Bash => {
                let rc = dir.path().join("bashrc");
                std::fs::write(&rc, BASH_RC).context("write bashrc")?;
                let argv = vec![
                    program.to_owned(),
                    "--rcfile".to_owned(),
                    rc.display().to_string(),
                    "-i".to_owned(),
                ];
                (argv, Vec::new())
            }
            ShellFlavor::Zsh => {
                std::fs::write(dir.path().join(".zshenv"), ZSH_ENV).context("write .zshenv")?;
                std::fs::write(dir.path().join(".zshrc"), ZSH_RC).context("write .zshrc")?;
                let env = vec![("ZDOTDIR".to_owned(), dir.path().display().to_string())];
                (vec![program.to_owned(), "-i".to_owned()], env)
            }
        };
        Ok(Self { argv, env, _rc_dir: dir })
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
