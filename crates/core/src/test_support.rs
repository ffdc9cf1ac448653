// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment fixtures shared by tests across crates

use crate::marker::PatchMarker;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// Builder for a minimal single-or-multi-container deployment.
pub struct DeploymentBuilder {
    namespace: String,
    name: String,
    containers: Vec<Container>,
    marker: Option<PatchMarker>,
    template_annotations: BTreeMap<String, String>,
}

impl DeploymentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: "default".to_string(),
            name: name.into(),
            containers: Vec::new(),
            marker: None,
            template_annotations: BTreeMap::new(),
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn container(mut self, name: &str, image: &str) -> Self {
        self.containers.push(Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn container_with_args(mut self, name: &str, image: &str, command: &[&str], args: &[&str]) -> Self {
        let owned = |v: &[&str]| (!v.is_empty()).then(|| v.iter().map(|s| s.to_string()).collect());
        self.containers.push(Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            command: owned(command),
            args: owned(args),
            ..Default::default()
        });
        self
    }

    pub fn patched(mut self) -> Self {
        self.marker = Some(PatchMarker::CURRENT);
        self
    }

    pub fn template_annotation(mut self, key: &str, value: &str) -> Self {
        self.template_annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Deployment {
        let labels = BTreeMap::from([("app".to_string(), self.name.clone())]);
        let mut annotations = self.template_annotations;
        if let Some(marker) = self.marker {
            let (k, v) = marker.annotation();
            annotations.insert(k.to_string(), v.to_string());
        }
        Deployment {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                selector: LabelSelector { match_labels: Some(labels.clone()), ..Default::default() },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        annotations: (!annotations.is_empty()).then_some(annotations),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec { containers: self.containers, ..Default::default() }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
