// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patch marker: cluster-visible evidence that a deployment runs the debug image.
//!
//! Exactly one encoding is recognised: the pod-template annotation
//! [`PATCHED_BY_ANNOTATION`] carrying [`PatchMarker::V1`]. The deployment-level
//! change cause is informational only and never consulted.

use k8s_openapi::api::apps::v1::Deployment;
use std::collections::BTreeMap;

/// Pod-template annotation whose presence marks a patched deployment.
pub const PATCHED_BY_ANNOTATION: &str = "podbug.dev/patched-by";

/// Deployment annotation recorded on patch and rollback.
pub const CHANGE_CAUSE_ANNOTATION: &str = "kubernetes.io/change-cause";

/// Change cause written by a patch.
pub const PATCH_CHANGE_CAUSE: &str = "podbug patch";

/// Versioned marker value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMarker {
    V1,
}

impl PatchMarker {
    pub const CURRENT: PatchMarker = PatchMarker::V1;

    pub fn value(self) -> &'static str {
        match self {
            PatchMarker::V1 => "podbug/v1",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "podbug/v1" => Some(PatchMarker::V1),
            _ => None,
        }
    }

    /// Annotation pair to merge into the pod template.
    pub fn annotation(self) -> (&'static str, &'static str) {
        (PATCHED_BY_ANNOTATION, self.value())
    }
}

crate::simple_display! {
    PatchMarker {
        V1 => "podbug/v1",
    }
}

fn template_annotations(deployment: &Deployment) -> Option<&BTreeMap<String, String>> {
    deployment.spec.as_ref()?.template.metadata.as_ref()?.annotations.as_ref()
}

/// Marker found on the deployment's pod template, if any.
pub fn marker_of(deployment: &Deployment) -> Option<PatchMarker> {
    template_annotations(deployment)?.get(PATCHED_BY_ANNOTATION).and_then(|v| PatchMarker::parse(v))
}

/// Whether the deployment currently runs the debug image.
///
/// Depends only on the object passed in, so callers must hand it a freshly
/// fetched deployment.
pub fn is_patched(deployment: &Deployment) -> bool {
    marker_of(deployment).is_some()
}

#[cfg(test)]
#[path = "marker_tests.rs"]
mod tests;
