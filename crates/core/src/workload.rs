// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only helpers over a fetched `Deployment`

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use std::collections::BTreeMap;
use std::fmt;

/// Suffix of the config snapshot ConfigMap and of the patch image name.
pub const PATCH_SUFFIX: &str = "-patch";

/// ConfigMap key holding the JSON snapshot of the pre-patch deployment.
pub const SNAPSHOT_KEY: &str = "deployment.json";

/// Where the snapshot ConfigMap is mounted inside the patched container.
pub const SNAPSHOT_MOUNT_PATH: &str = "/etc/config/mounted";

/// Name of the snapshot volume in the patched pod template.
pub const SNAPSHOT_VOLUME: &str = "patch-configmap";

/// Tag of every patch image.
pub const PATCH_IMAGE_TAG: &str = "latest";

/// Namespace and name of the deployment under debug.
///
/// Holds no cluster state; every operation re-fetches the object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }

    /// ConfigMap name of this workload's config snapshot.
    pub fn snapshot_name(&self) -> String {
        snapshot_name(&self.name)
    }

    /// Absolute path of the debug binary inside the container.
    pub fn binary_path(&self) -> String {
        format!("/{}", self.name)
    }

    /// Upload target used before the binary is moved into place.
    pub fn staging_binary_path(&self) -> String {
        format!("/{}-build", self.name)
    }

    /// Local image name of the patch image, without repository.
    pub fn patch_image_name(&self) -> String {
        format!("{}{}", self.name, PATCH_SUFFIX)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

pub fn snapshot_name(deployment: &str) -> String {
    format!("{deployment}{PATCH_SUFFIX}")
}

/// Launch arguments of a container as recorded in a deployment spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerArgs {
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl ContainerArgs {
    pub fn of(container: &Container) -> Self {
        Self {
            command: container.command.clone().unwrap_or_default(),
            args: container.args.clone().unwrap_or_default(),
        }
    }

    /// Arguments to hand to the debugged binary.
    ///
    /// The binary replaces `command[0]`, so trailing command words come first.
    pub fn program_args(&self) -> Vec<String> {
        self.command.iter().skip(1).chain(self.args.iter()).cloned().collect()
    }
}

pub fn containers(deployment: &Deployment) -> &[Container] {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .map(|p| p.containers.as_slice())
        .unwrap_or_default()
}

pub fn container_names(deployment: &Deployment) -> Vec<String> {
    containers(deployment).iter().map(|c| c.name.clone()).collect()
}

pub fn find_container<'a>(deployment: &'a Deployment, name: &str) -> Option<&'a Container> {
    containers(deployment).iter().find(|c| c.name == name)
}

/// Image of the named container.
pub fn image_of(deployment: &Deployment, container: &str) -> Option<String> {
    find_container(deployment, container).and_then(|c| c.image.clone())
}

/// `matchLabels` of the deployment selector.
pub fn selector_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.selector.match_labels.clone())
        .unwrap_or_default()
}

/// Render labels as a `k=v,k=v` selector string.
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;
