// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

fn main() {
    // The handshake compares version strings between seer and seermux, so
    // local builds carry the git description instead of the Cargo.toml
    // placeholder.
    if let Ok(output) = std::process::Command::new("git")
        .args(["describe", "--tags", "--always"])
        .output()
    {
        let desc = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !desc.is_empty() {
            let version = desc.strip_prefix('v').unwrap_or(&desc);
            println!("cargo:rustc-env=SEER_VERSION={version}");
        }
    }
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/tags");
}
