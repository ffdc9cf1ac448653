// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::DeploymentBuilder;

#[test]
fn workload_paths_derive_from_name() {
    let w = WorkloadRef::new("team", "web");
    assert_eq!(w.snapshot_name(), "web-patch");
    assert_eq!(w.binary_path(), "/web");
    assert_eq!(w.staging_binary_path(), "/web-build");
    assert_eq!(w.patch_image_name(), "web-patch");
    assert_eq!(w.to_string(), "team/web");
}

#[test]
fn container_lookup() {
    let d = DeploymentBuilder::new("web")
        .container("app", "alpine:latest")
        .container("sidecar", "envoy:1.29")
        .build();
    assert_eq!(container_names(&d), vec!["app", "sidecar"]);
    assert_eq!(image_of(&d, "sidecar").as_deref(), Some("envoy:1.29"));
    assert!(find_container(&d, "missing").is_none());
}

#[test]
fn selector_renders_sorted_pairs() {
    let d = DeploymentBuilder::new("web").container("app", "alpine").build();
    let labels = selector_labels(&d);
    assert_eq!(label_selector(&labels), "app=web");

    let mut many = BTreeMap::new();
    many.insert("tier".to_string(), "backend".to_string());
    many.insert("app".to_string(), "web".to_string());
    assert_eq!(label_selector(&many), "app=web,tier=backend");
}

#[test]
fn program_args_skip_command_head() {
    let d = DeploymentBuilder::new("web")
        .container_with_args("app", "alpine", &["/bin/web", "serve"], &["--port", "80"])
        .build();
    let args = ContainerArgs::of(find_container(&d, "app").unwrap());
    assert_eq!(args.program_args(), vec!["serve", "--port", "80"]);
}

#[test]
fn program_args_without_command() {
    let d = DeploymentBuilder::new("web").container_with_args("app", "alpine", &[], &["-v"]).build();
    let args = ContainerArgs::of(find_container(&d, "app").unwrap());
    assert_eq!(args.program_args(), vec!["-v"]);
}
