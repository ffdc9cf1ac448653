// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input validation that fails before any cluster access.

use crate::prelude::*;

#[test]
fn mount_without_separator_is_rejected() {
    cli().args(&["patch", "web", "-m", "nocolon"]).fails_with(1).stderr_has("error:").stdout_is_empty();
}

#[test]
fn mount_with_missing_host_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().to_str().unwrap();
    cli()
        .args(&["-d", dir_arg, "patch", "web", "-m", "does-not-exist:/src"])
        .fails_with(1)
        .stderr_has("error:")
        .stderr_has("does-not-exist");
}

#[test]
fn bad_listen_address_is_rejected() {
    cli().args(&["delve", "web", "--listen", "localhost"]).fails_with(1).stderr_has("error:");
}

#[test]
fn missing_deployment_is_a_usage_error() {
    cli().args(&["shell"]).fails_with(2).stderr_has("Usage:");
}
