// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patch and rollback of a deployment into debug mode.
//!
//! A patch swaps the target container's image for a debug image (the
//! original plus `dlv`, idling instead of running the program), strips its
//! command and probes, and mounts a snapshot of the pre-patch deployment.
//! Rollback walks the rollout history backwards until the patch marker is
//! gone. Neither operation trusts a cached deployment: the object is fetched
//! again after anything that may have changed it.

use crate::env::Timing;
use crate::{validate, Error};
use k8s_openapi::api::apps::v1::Deployment;
use podbug_adapters::{ClusterAdapter, ImageAdapter};
use podbug_core::marker::{CHANGE_CAUSE_ANNOTATION, PATCH_CHANGE_CAUSE};
use podbug_core::workload::{image_of, PATCH_IMAGE_TAG, SNAPSHOT_KEY, SNAPSHOT_MOUNT_PATH, SNAPSHOT_VOLUME};
use podbug_core::{is_patched, ImageRef, Mount, PatchMarker, ValidationError, WorkloadRef};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Build recipe for the debug image. `IMAGE` is the original image.
pub const PATCH_DOCKERFILE: &str = r#"ARG IMAGE
FROM golang:alpine AS dlv
RUN CGO_ENABLED=0 go install github.com/go-delve/delve/cmd/dlv@latest

FROM $IMAGE
COPY --from=dlv /go/bin/dlv /usr/local/bin/dlv
ENTRYPOINT ["/bin/sh", "-c", "while true; do sleep 3600; done"]
"#;

/// What to patch in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRequest {
    /// Defaults to the deployment name.
    pub container: Option<String>,
    /// Base image; defaults to the container's current image.
    pub image: Option<String>,
    pub mounts: Vec<Mount>,
}

/// Outcome of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    /// The deployment was already patched and got rolled back first.
    pub rolled_back_first: bool,
    pub container: String,
    pub image: ImageRef,
}

/// Patch/rollback state machine over one namespace.
#[derive(Clone)]
pub struct Patcher<K, I> {
    cluster: K,
    images: I,
    timing: Timing,
    repository: Option<String>,
}

impl<K, I> Patcher<K, I>
where
    K: ClusterAdapter,
    I: ImageAdapter,
{
    pub fn new(cluster: K, images: I, timing: Timing) -> Self {
        Self { cluster, images, timing, repository: None }
    }

    /// Registry prefix for the debug image, overriding the one parsed from
    /// the deployed image.
    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository.filter(|r| !r.is_empty());
        self
    }

    pub async fn is_patched(&self, deployment: &str) -> Result<bool, Error> {
        let current = self.cluster.get_deployment(deployment).await?;
        Ok(is_patched(&current))
    }

    /// Put `deployment` into debug mode, rolling back an earlier patch first.
    pub async fn patch(&self, deployment: &str, request: &PatchRequest) -> Result<PatchReport, Error> {
        let workload = WorkloadRef::new(self.cluster.namespace(), deployment);
        let mut current = validate::deployment(&self.cluster, deployment).await?;

        let rolled_back_first = is_patched(&current);
        if rolled_back_first {
            tracing::warn!(%workload, "deployment already patched, rolling back first");
            self.rollback_until_unpatched(deployment).await?;
            current = self.cluster.get_deployment(deployment).await?;
        }

        let container = validate::container(&current, request.container.as_deref())?;
        let deployed = image_of(&current, &container)
            .ok_or_else(|| ValidationError::Image(format!("container {container} has no image")))?;
        let deployed_ref = ImageRef::parse(&deployed)?;
        let base = request.image.clone().unwrap_or_else(|| deployed.clone());
        let repository = self.repository.clone().or(deployed_ref.repository);
        let image = ImageRef::new(repository.as_deref(), workload.patch_image_name(), PATCH_IMAGE_TAG);

        self.write_snapshot(&workload, &current).await?;
        self.cluster.wait_for_rollout(deployment, self.timing.rollout_timeout).await?;

        let platform = self.images.platform(&base).await?;
        let context = tempfile::tempdir()?;
        tokio::fs::write(context.path().join("Dockerfile"), PATCH_DOCKERFILE).await?;
        tracing::info!(%workload, %base, %image, %platform, "building debug image");
        self.images.build(context.path(), &base, &image, &platform).await?;
        if image.repository.is_some() {
            self.images.push(&image).await?;
        }

        let body = patch_body(&workload, &container, &image, &request.mounts);
        tracing::info!(%workload, %container, "patching deployment");
        self.cluster.patch_deployment(deployment, &body).await?;
        self.cluster.wait_for_rollout(deployment, self.timing.rollout_timeout).await?;

        Ok(PatchReport { rolled_back_first, container, image })
    }

    /// Restore the last unpatched revision. Returns its revision number.
    pub async fn rollback(&self, deployment: &str) -> Result<u32, Error> {
        let current = validate::deployment(&self.cluster, deployment).await?;
        if !is_patched(&current) {
            return Err(Error::NotPatched { deployment: deployment.to_string() });
        }
        self.rollback_until_unpatched(deployment).await
    }

    async fn write_snapshot(&self, workload: &WorkloadRef, deployment: &Deployment) -> Result<(), Error> {
        let name = workload.snapshot_name();
        // creation fails on a name conflict
        if let Err(e) = self.cluster.delete_config_map(&name).await {
            tracing::warn!(%name, error = %e, "could not delete stale snapshot");
        }
        let data = BTreeMap::from([(SNAPSHOT_KEY.to_string(), serde_json::to_string(deployment)?)]);
        self.cluster.create_config_map(&name, data).await?;
        Ok(())
    }

    async fn rollback_until_unpatched(&self, deployment: &str) -> Result<u32, Error> {
        let snapshot = podbug_core::snapshot_name(deployment);
        let latest = self.cluster.latest_revision(deployment).await?;

        for revision in (1..latest).rev() {
            match self.cluster.delete_config_map(&snapshot).await {
                Ok(true) => tracing::debug!(%snapshot, "snapshot deleted"),
                Ok(false) => tracing::warn!(%snapshot, "snapshot already gone"),
                Err(e) => tracing::warn!(%snapshot, error = %e, "could not delete snapshot"),
            }

            tracing::info!(%deployment, revision, "rolling back");
            if let Err(e) = self.cluster.rollout_undo(deployment, revision).await {
                if e.is_missing_revision() {
                    tracing::warn!(%deployment, revision, error = %e, "revision unavailable, trying an older one");
                    continue;
                }
                return Err(e.into());
            }

            let current = self.cluster.get_deployment(deployment).await?;
            if !is_patched(&current) {
                self.cluster.annotate_change_cause(deployment, &format!("rollback to {revision}")).await?;
                self.cluster.wait_for_rollout(deployment, self.timing.rollout_timeout).await?;
                return Ok(revision);
            }
        }

        Err(Error::RollbackExhausted { deployment: deployment.to_string(), latest })
    }
}

/// Strategic merge patch that puts `container` into debug mode.
pub fn patch_body(workload: &WorkloadRef, container: &str, image: &ImageRef, mounts: &[Mount]) -> Value {
    let (marker_key, marker_value) = PatchMarker::CURRENT.annotation();

    let mut volume_mounts = vec![json!({ "name": SNAPSHOT_VOLUME, "mountPath": SNAPSHOT_MOUNT_PATH })];
    let mut volumes = vec![json!({ "name": SNAPSHOT_VOLUME, "configMap": { "name": workload.snapshot_name() } })];
    for (i, mount) in mounts.iter().enumerate() {
        let name = Mount::volume_name(i);
        volume_mounts.push(json!({ "name": name, "mountPath": mount.mount_path }));
        volumes.push(json!({ "name": name, "hostPath": { "path": mount.host_path.display().to_string() } }));
    }

    json!({
        "metadata": {
            "annotations": { CHANGE_CAUSE_ANNOTATION: PATCH_CHANGE_CAUSE }
        },
        "spec": {
            "template": {
                "metadata": {
                    "annotations": { marker_key: marker_value }
                },
                "spec": {
                    "containers": [{
                        "name": container,
                        "image": image.to_string(),
                        "command": null,
                        "args": null,
                        "livenessProbe": null,
                        "readinessProbe": null,
                        "volumeMounts": volume_mounts,
                    }],
                    "volumes": volumes,
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
