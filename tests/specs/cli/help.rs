// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("patch")
        .stdout_has("rollback")
        .stdout_has("shell")
        .stdout_has("delve");
}

#[test]
fn delve_help_shows_flags() {
    cli()
        .args(&["delve", "--help"])
        .passes()
        .stdout_has("--source")
        .stdout_has("--listen")
        .stdout_has("--continue")
        .stdout_has("--vscode")
        .stdout_has("--cleanup");
}

#[test]
fn patch_help_shows_flags() {
    cli().args(&["patch", "--help"]).passes().stdout_has("--image").stdout_has("--mount").stdout_has("--rollback");
}

#[test]
fn version_flag_prints_version() {
    cli().args(&["--version"]).passes().stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn version_subcommand_prints_version() {
    cli().args(&["version"]).passes().stdout_has("podbug").stdout_has(env!("CARGO_PKG_VERSION"));
}
