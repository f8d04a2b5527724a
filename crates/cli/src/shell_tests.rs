// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    bash       = { "/bin/bash", Some(ShellFlavor::Bash) },
    login      = { "-bash", Some(ShellFlavor::Bash) },
    sh         = { "/bin/sh", Some(ShellFlavor::Bash) },
    zsh        = { "/usr/bin/zsh", Some(ShellFlavor::Zsh) },
    zsh_ver    = { "zsh-5.9", Some(ShellFlavor::Zsh) },
    fish       = { "/usr/bin/fish", None },
    dir_only   = { "/", None },
)]
fn flavor_from_program(program: &str, expected: Option<ShellFlavor>) {
    assert_eq!(ShellFlavor::from_program(program), expected);
}

#[test]
fn flavor_round_trips_through_strings() -> anyhow::Result<()> {
    for flavor in [ShellFlavor::Bash, ShellFlavor::Zsh] {
        assert_eq!(flavor.to_string().parse::<ShellFlavor>()?, flavor);
    }
    crate::assert_err_contains!("tcsh".parse::<ShellFlavor>(), "unsupported shell flavor");
    Ok(())
}

#[test]
fn bash_launch_uses_rcfile() -> anyhow::Result<()> {
    let launch = ShellLaunch::prepare(ShellFlavor::Bash, "/bin/bash")?;
    assert_eq!(launch.argv[0], "/bin/bash");
    assert_eq!(launch.argv[1], "--rcfile");
    assert_eq!(launch.argv.last().map(String::as_str), Some("-i"));
    assert!(launch.env.is_empty());

    let rc = std::fs::read_to_string(&launch.argv[2])?;
    assert!(rc.contains(r"\e]6973;D${PWD}\a"));
    assert!(rc.contains(r"\e]6973;P\a"));
    assert!(rc.contains(r"\e]6973;C\a"));
    Ok(())
}

#[test]
fn zsh_launch_sets_zdotdir() -> anyhow::Result<()> {
    let launch = ShellLaunch::prepare(ShellFlavor::Zsh, "/usr/bin/zsh")?;
    assert_eq!(launch.argv, vec!["/usr/bin/zsh".to_owned(), "-i".to_owned()]);
    let (key, dir) = &launch.env[0];
    assert_eq!(key, "ZDOTDIR");

    let rc = std::fs::read_to_string(std::path::Path::new(dir).join(".zshrc"))?;
    assert!(rc.contains("RPROMPT="));
    assert!(rc.contains(r"\e]6973;R\a"));
    assert!(std::path::Path::new(dir).join(".zshenv").exists());
    Ok(())
}

#[test]
fn rc_dir_is_removed_with_the_launch() -> anyhow::Result<()> {
    let launch = ShellLaunch::prepare(ShellFlavor::Bash, "/bin/bash")?;
    let rc = std::path::PathBuf::from(&launch.argv[2]);
    assert!(rc.exists());
    drop(launch);
    assert!(!rc.exists());
    Ok(())
}
