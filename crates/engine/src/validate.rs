// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolve operator-supplied names against what the cluster reports.

use crate::Error;
use k8s_openapi::api::apps::v1::Deployment;
use podbug_adapters::ClusterAdapter;
use podbug_core::validate_resource;
use podbug_core::workload::{container_names, label_selector, selector_labels};

/// The adapter's namespace must exist.
pub async fn namespace<K: ClusterAdapter>(cluster: &K) -> Result<(), Error> {
    let available = cluster.namespaces().await?;
    validate_resource("namespace", cluster.namespace(), None, &available)?;
    Ok(())
}

/// Fetch a deployment, listing the alternatives when it does not exist.
pub async fn deployment<K: ClusterAdapter>(cluster: &K, name: &str) -> Result<Deployment, Error> {
    let available = cluster.deployments().await?;
    let scope = format!("namespace {:?}", cluster.namespace());
    validate_resource("deployment", name, Some(&scope), &available)?;
    Ok(cluster.get_deployment(name).await?)
}

/// Container to operate on; defaults to the deployment's name.
pub fn container(deployment: &Deployment, name: Option<&str>) -> Result<String, Error> {
    let deployment_name = deployment.metadata.name.clone().unwrap_or_default();
    let name = match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => deployment_name.clone(),
    };
    let scope = format!("deployment {deployment_name:?}");
    validate_resource("container", &name, Some(&scope), &container_names(deployment))?;
    Ok(name)
}

/// Pod to operate on; defaults to the most recently started running pod of
/// the deployment.
pub async fn pod<K: ClusterAdapter>(cluster: &K, deployment: &Deployment, name: Option<&str>) -> Result<String, Error> {
    let selector = label_selector(&selector_labels(deployment));
    match name {
        Some(n) if !n.is_empty() => {
            let available = cluster.pods(&selector).await?;
            let scope = format!("deployment {:?}", deployment.metadata.name.as_deref().unwrap_or_default());
            validate_resource("pod", n, Some(&scope), &available)?;
            Ok(n.to_string())
        }
        _ => cluster.most_recent_running_pod(&selector).await?.ok_or(Error::NoRunningPod { selector }),
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
