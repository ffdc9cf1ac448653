// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ClusterAdapter, ClusterError, CONTAINERS_READY, FORWARDING_READY};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use podbug_core::ListenAddr;
use podbug_exec::{parse_latest_revision, Cmd, KubectlCmd, Running};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Cluster adapter backed by the Kubernetes API and `kubectl`.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    kubectl: KubectlCmd,
}

impl KubeCluster {
    /// Connect using the ambient kubeconfig or in-cluster config.
    pub async fn new(namespace: impl Into<String>) -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client, kubectl: KubectlCmd::new(namespace) })
    }

    fn deployments_api(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), self.kubectl.namespace())
    }

    fn config_maps_api(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), self.kubectl.namespace())
    }

    fn pods_api(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), self.kubectl.namespace())
    }
}

/// Run a kubectl invocation to completion.
///
/// Dropping the returned future kills the process.
async fn run(cmd: Cmd) -> Result<String, ClusterError> {
    Ok(cmd.run(&CancellationToken::new()).await?)
}

/// Map a 404 on delete to `Ok(false)`.
fn deleted<T>(result: Result<T, kube::Error>) -> Result<bool, ClusterError> {
    match result {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Wait for a port-forward to print its listening line.
///
/// Exiting first is [`ClusterError::PortForwardExited`] carrying the output;
/// staying silent past `ready_timeout` terminates it.
pub(crate) async fn await_forwarding(
    pod: &str,
    mut running: Running,
    mut lines: mpsc::UnboundedReceiver<String>,
    ready_timeout: Duration,
) -> Result<Running, ClusterError> {
    running.wait_started().await?;
    let ready = async {
        while let Some(line) = lines.recv().await {
            if line.contains(FORWARDING_READY) {
                return true;
            }
        }
        false
    };
    match tokio::time::timeout(ready_timeout, ready).await {
        Ok(true) => Ok(running),
        Ok(false) => {
            let reason = match running.wait().await {
                Ok(out) => out,
                Err(e) => e.to_string(),
            };
            Err(ClusterError::PortForwardExited { pod: pod.to_string(), reason })
        }
        Err(_) => {
            running.terminate();
            Err(ClusterError::PortForwardTimeout { pod: pod.to_string(), timeout: ready_timeout })
        }
    }
}

#[async_trait]
impl ClusterAdapter for KubeCluster {
    fn namespace(&self) -> &str {
        self.kubectl.namespace()
    }

    async fn namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn deployments(&self) -> Result<Vec<String>, ClusterError> {
        let list = self.deployments_api().list(&ListParams::default()).await?;
        Ok(list.items.iter().map(|d| d.name_any()).collect())
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, ClusterError> {
        self.deployments_api()
            .get_opt(name)
            .await?
            .ok_or_else(|| ClusterError::NotFound { kind: "deployment", name: name.to_string() })
    }

    async fn pods(&self, selector: &str) -> Result<Vec<String>, ClusterError> {
        let lp = ListParams::default().labels(selector);
        let list = self.pods_api().list(&lp).await?;
        Ok(list.items.iter().map(|p| p.name_any()).collect())
    }

    async fn most_recent_running_pod(&self, selector: &str) -> Result<Option<String>, ClusterError> {
        let lp = ListParams::default().labels(selector).fields("status.phase=Running");
        let list = self.pods_api().list(&lp).await?;
        Ok(list
            .items
            .into_iter()
            .max_by_key(|p| p.status.as_ref().and_then(|s| s.start_time.clone()))
            .map(|p| p.name_any()))
    }

    async fn wait_for_rollout(&self, deployment: &str, timeout: Duration) -> Result<(), ClusterError> {
        tracing::debug!(%deployment, "waiting for rollout");
        run(self.kubectl.rollout_status(deployment, timeout)).await?;
        Ok(())
    }

    async fn wait_for_pod(&self, pod: &str, condition: &str, timeout: Duration) -> Result<(), ClusterError> {
        run(self.kubectl.wait_for_pod(pod, condition, timeout)).await?;
        Ok(())
    }

    async fn patch_deployment(&self, deployment: &str, patch: &serde_json::Value) -> Result<(), ClusterError> {
        self.deployments_api().patch(deployment, &PatchParams::default(), &Patch::Strategic(patch)).await?;
        Ok(())
    }

    async fn latest_revision(&self, deployment: &str) -> Result<u32, ClusterError> {
        let out = run(self.kubectl.rollout_history(deployment)).await?;
        Ok(parse_latest_revision(&out)?)
    }

    async fn rollout_undo(&self, deployment: &str, revision: u32) -> Result<(), ClusterError> {
        run(self.kubectl.rollout_undo(deployment, revision)).await?;
        Ok(())
    }

    async fn annotate_change_cause(&self, deployment: &str, cause: &str) -> Result<(), ClusterError> {
        run(self.kubectl.annotate_change_cause(deployment, cause)).await?;
        Ok(())
    }

    async fn create_config_map(&self, name: &str, data: BTreeMap<String, String>) -> Result<(), ClusterError> {
        let cm = ConfigMap {
            metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            data: Some(data),
            ..Default::default()
        };
        self.config_maps_api().create(&PostParams::default(), &cm).await?;
        Ok(())
    }

    async fn delete_config_map(&self, name: &str) -> Result<bool, ClusterError> {
        deleted(self.config_maps_api().delete(name, &DeleteParams::default()).await)
    }

    async fn config_map_key(&self, name: &str, key: &str) -> Result<String, ClusterError> {
        let cm = self
            .config_maps_api()
            .get_opt(name)
            .await?
            .ok_or_else(|| ClusterError::NotFound { kind: "configmap", name: name.to_string() })?;
        cm.data
            .and_then(|mut d| d.remove(key))
            .ok_or_else(|| ClusterError::NotFound { kind: "configmap key", name: format!("{name}/{key}") })
    }

    async fn exec(&self, pod: &str, container: &str, command: &[String]) -> Result<String, ClusterError> {
        run(self.kubectl.exec(pod, container, command)).await
    }

    fn exec_background(&self, pod: &str, container: &str, command: &[String]) -> Running {
        self.kubectl.exec(pod, container, command).spawn()
    }

    async fn copy_to_pod(
        &self,
        pod: &str,
        container: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), ClusterError> {
        let source = source.display().to_string();
        run(self.kubectl.copy_to_pod(pod, container, &source, destination)).await?;
        Ok(())
    }

    async fn port_forward(&self, pod: &str, addr: &ListenAddr, ready_timeout: Duration) -> Result<Running, ClusterError> {
        let (tx, lines) = mpsc::unbounded_channel();
        let running = self.kubectl.port_forward(pod, &addr.host, addr.port).stdout_lines(tx).spawn();
        let running = await_forwarding(pod, running, lines, ready_timeout).await?;
        tracing::info!(%pod, %addr, "port-forward listening");
        Ok(running)
    }

    async fn delete_service(&self, name: &str) -> Result<bool, ClusterError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), self.kubectl.namespace());
        deleted(api.delete(name, &DeleteParams::default()).await)
    }

    async fn shell(&self, pod: &str, container: &str, ready_timeout: Duration) -> Result<(), ClusterError> {
        self.wait_for_pod(pod, CONTAINERS_READY, ready_timeout).await?;
        run(self.kubectl.exec_shell(pod, container, "/")).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
