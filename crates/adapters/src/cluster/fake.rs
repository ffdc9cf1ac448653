// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cluster for tests.
//!
//! Deployments keep a rollout history with kubectl's numbering: a template
//! change appends a revision, and undoing to revision N moves N to the end
//! under a new number. In-container commands understand `pidof`, `kill` and
//! `mv`; `dlv` launched in the background registers itself and the debugged
//! binary as processes until they are killed.

use super::{ClusterAdapter, ClusterError, MISSING_REVISION};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::core::ErrorResponse;
use parking_lot::Mutex;
use podbug_core::marker::CHANGE_CAUSE_ANNOTATION;
use podbug_core::workload::selector_labels;
use podbug_core::ListenAddr;
use podbug_exec::{ExecError, Running};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recorded mutating or process-launching call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    WaitForRollout { deployment: String },
    Patch { deployment: String, patch: Value },
    RolloutUndo { deployment: String, revision: u32 },
    Annotate { deployment: String, cause: String },
    CreateConfigMap { name: String },
    DeleteConfigMap { name: String },
    Exec { pod: String, container: String, command: Vec<String> },
    ExecBackground { pod: String, container: String, command: Vec<String> },
    Copy { pod: String, container: String, destination: String },
    PortForward { pod: String, addr: String },
    DeleteService { name: String },
    Shell { pod: String, container: String },
}

struct Workload {
    current: Deployment,
    history: Vec<(u32, PodTemplateSpec)>,
}

impl Workload {
    fn latest(&self) -> u32 {
        self.history.iter().map(|(r, _)| *r).max().unwrap_or(0)
    }

    /// Record `template` as the newest revision, renumbering an identical one.
    fn record(&mut self, template: PodTemplateSpec) {
        let next = self.latest() + 1;
        self.history.retain(|(_, t)| *t != template);
        self.history.push((next, template));
    }

    fn template(&self) -> Option<&PodTemplateSpec> {
        self.current.spec.as_ref().map(|s| &s.template)
    }
}

struct FakePod {
    name: String,
    labels: BTreeMap<String, String>,
    running: bool,
}

struct Process {
    pid: u32,
    name: String,
    exited: CancellationToken,
}

struct State {
    namespaces: Vec<String>,
    workloads: BTreeMap<String, Workload>,
    pods: Vec<FakePod>,
    config_maps: BTreeMap<String, BTreeMap<String, String>>,
    services: BTreeSet<String>,
    processes: BTreeMap<(String, String), Vec<Process>>,
    files: BTreeSet<(String, String, String)>,
    next_pid: u32,
    kill_resistance: usize,
    undo_failure: Option<String>,
    calls: Vec<ClusterCall>,
}

/// Fake cluster adapter for testing
#[derive(Clone)]
pub struct FakeCluster {
    namespace: String,
    inner: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            inner: Arc::new(Mutex::new(State {
                namespaces: vec![namespace.clone()],
                workloads: BTreeMap::new(),
                pods: Vec::new(),
                config_maps: BTreeMap::new(),
                services: BTreeSet::new(),
                processes: BTreeMap::new(),
                files: BTreeSet::new(),
                next_pid: 100,
                kill_resistance: 0,
                undo_failure: None,
                calls: Vec::new(),
            })),
            namespace,
        }
    }

    /// Add a deployment at revision 1 with one running pod `<name>-0`.
    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let labels = selector_labels(&deployment);
        let template = deployment.spec.as_ref().map(|s| s.template.clone()).unwrap_or_default();
        {
            let mut state = self.inner.lock();
            state.workloads.insert(name.clone(), Workload { current: deployment, history: vec![(1, template)] });
            state.pods.push(FakePod { name: format!("{name}-0"), labels, running: true });
        }
        self
    }

    pub fn with_namespace(self, namespace: &str) -> Self {
        self.inner.lock().namespaces.push(namespace.to_string());
        self
    }

    /// Make a namespace disappear from the cluster.
    pub fn remove_namespace(&self, namespace: &str) {
        self.inner.lock().namespaces.retain(|n| n != namespace);
    }

    /// Add a pod; later pods count as more recently started.
    pub fn add_pod(&self, name: &str, labels: &[(&str, &str)], running: bool) {
        let labels = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.inner.lock().pods.push(FakePod { name: name.to_string(), labels, running });
    }

    /// Start a process inside a container and return its pid.
    pub fn add_process(&self, pod: &str, container: &str, name: &str) -> u32 {
        let mut state = self.inner.lock();
        spawn_process(&mut state, pod, container, name).0
    }

    /// Number of `kill` invocations to ignore before processes die.
    pub fn set_kill_resistance(&self, attempts: usize) {
        self.inner.lock().kill_resistance = attempts;
    }

    /// Fail the next `rollout_undo` with exit code 1 and `output`.
    pub fn fail_next_undo(&self, output: &str) {
        self.inner.lock().undo_failure = Some(output.to_string());
    }

    pub fn add_service(&self, name: &str) {
        self.inner.lock().services.insert(name.to_string());
    }

    pub fn services(&self) -> Vec<String> {
        self.inner.lock().services.iter().cloned().collect()
    }

    pub fn deployment(&self, name: &str) -> Option<Deployment> {
        self.inner.lock().workloads.get(name).map(|w| w.current.clone())
    }

    /// Revision numbers in history order.
    pub fn revisions(&self, name: &str) -> Vec<u32> {
        self.inner.lock().workloads.get(name).map(|w| w.history.iter().map(|(r, _)| *r).collect()).unwrap_or_default()
    }

    pub fn config_maps(&self) -> Vec<String> {
        self.inner.lock().config_maps.keys().cloned().collect()
    }

    pub fn config_map(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.inner.lock().config_maps.get(name).cloned()
    }

    /// Names of live processes in a container.
    pub fn processes(&self, pod: &str, container: &str) -> Vec<String> {
        self.inner
            .lock()
            .processes
            .get(&(pod.to_string(), container.to_string()))
            .map(|ps| ps.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_file(&self, pod: &str, container: &str, path: &str) -> bool {
        self.inner.lock().files.contains(&(pod.to_string(), container.to_string(), path.to_string()))
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, call: ClusterCall) {
        self.inner.lock().calls.push(call);
    }
}

fn spawn_process(state: &mut State, pod: &str, container: &str, name: &str) -> (u32, CancellationToken) {
    state.next_pid += 1;
    let pid = state.next_pid;
    let exited = CancellationToken::new();
    state
        .processes
        .entry((pod.to_string(), container.to_string()))
        .or_default()
        .push(Process { pid, name: name.to_string(), exited: exited.clone() });
    (pid, exited)
}

fn failed(command: &[String], code: i32, output: &str) -> ClusterError {
    ClusterError::Exec(ExecError::Failed { command: command.join(" "), code: Some(code), output: output.to_string() })
}

fn not_found(kind: &'static str, name: &str) -> ClusterError {
    ClusterError::NotFound { kind, name: name.to_string() }
}

fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector
        .split(',')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .all(|(k, v)| labels.get(k).map(String::as_str) == Some(v))
}

/// Strategic merge: objects merge recursively, `null` deletes a key, and
/// lists of named objects merge by `name`.
fn strategic_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(t), Value::Object(p)) => {
            for (k, v) in p {
                if v.is_null() {
                    t.remove(k);
                    continue;
                }
                match t.get_mut(k) {
                    Some(existing) => strategic_merge(existing, v),
                    None => {
                        t.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (Value::Array(t), Value::Array(p)) if p.iter().all(|v| v.get("name").is_some()) => {
            for item in p {
                match t.iter_mut().find(|e| e.get("name") == item.get("name")) {
                    Some(existing) => strategic_merge(existing, item),
                    None => t.push(item.clone()),
                }
            }
        }
        (t, p) => *t = p.clone(),
    }
}

#[async_trait]
impl ClusterAdapter for FakeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn namespaces(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.inner.lock().namespaces.clone())
    }

    async fn deployments(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.inner.lock().workloads.keys().cloned().collect())
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, ClusterError> {
        self.deployment(name).ok_or_else(|| not_found("deployment", name))
    }

    async fn pods(&self, selector: &str) -> Result<Vec<String>, ClusterError> {
        let state = self.inner.lock();
        Ok(state.pods.iter().filter(|p| matches_selector(&p.labels, selector)).map(|p| p.name.clone()).collect())
    }

    async fn most_recent_running_pod(&self, selector: &str) -> Result<Option<String>, ClusterError> {
        let state = self.inner.lock();
        Ok(state
            .pods
            .iter()
            .rev()
            .find(|p| p.running && matches_selector(&p.labels, selector))
            .map(|p| p.name.clone()))
    }

    async fn wait_for_rollout(&self, deployment: &str, _timeout: Duration) -> Result<(), ClusterError> {
        self.record(ClusterCall::WaitForRollout { deployment: deployment.to_string() });
        if self.inner.lock().workloads.contains_key(deployment) {
            Ok(())
        } else {
            Err(not_found("deployment", deployment))
        }
    }

    async fn wait_for_pod(&self, pod: &str, _condition: &str, _timeout: Duration) -> Result<(), ClusterError> {
        if self.inner.lock().pods.iter().any(|p| p.name == pod && p.running) {
            Ok(())
        } else {
            Err(not_found("pod", pod))
        }
    }

    async fn patch_deployment(&self, deployment: &str, patch: &Value) -> Result<(), ClusterError> {
        self.record(ClusterCall::Patch { deployment: deployment.to_string(), patch: patch.clone() });
        let mut state = self.inner.lock();
        let workload = state.workloads.get_mut(deployment).ok_or_else(|| not_found("deployment", deployment))?;
        let mut value = serde_json::to_value(&workload.current)?;
        strategic_merge(&mut value, patch);
        let patched: Deployment = serde_json::from_value(value)?;
        let before = workload.template().cloned();
        workload.current = patched;
        if let Some(template) = workload.template().cloned() {
            if Some(&template) != before.as_ref() {
                workload.record(template);
            }
        }
        Ok(())
    }

    async fn latest_revision(&self, deployment: &str) -> Result<u32, ClusterError> {
        let state = self.inner.lock();
        let workload = state.workloads.get(deployment).ok_or_else(|| not_found("deployment", deployment))?;
        Ok(workload.latest())
    }

    async fn rollout_undo(&self, deployment: &str, revision: u32) -> Result<(), ClusterError> {
        self.record(ClusterCall::RolloutUndo { deployment: deployment.to_string(), revision });
        let mut state = self.inner.lock();
        let command = vec!["rollout".to_string(), "undo".to_string(), format!("deployment/{deployment}")];
        if let Some(output) = state.undo_failure.take() {
            return Err(failed(&command, 1, &output));
        }
        let workload = state.workloads.get_mut(deployment).ok_or_else(|| not_found("deployment", deployment))?;
        let Some((_, template)) = workload.history.iter().find(|(r, _)| *r == revision).cloned() else {
            return Err(failed(&command, 1, &format!("error: {MISSING_REVISION}")));
        };
        if workload.template() == Some(&template) {
            return Ok(());
        }
        if let Some(spec) = workload.current.spec.as_mut() {
            spec.template = template.clone();
        }
        workload.record(template);
        Ok(())
    }

    async fn annotate_change_cause(&self, deployment: &str, cause: &str) -> Result<(), ClusterError> {
        self.record(ClusterCall::Annotate { deployment: deployment.to_string(), cause: cause.to_string() });
        let mut state = self.inner.lock();
        let workload = state.workloads.get_mut(deployment).ok_or_else(|| not_found("deployment", deployment))?;
        workload
            .current
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(CHANGE_CAUSE_ANNOTATION.to_string(), cause.to_string());
        Ok(())
    }

    async fn create_config_map(&self, name: &str, data: BTreeMap<String, String>) -> Result<(), ClusterError> {
        self.record(ClusterCall::CreateConfigMap { name: name.to_string() });
        let mut state = self.inner.lock();
        if state.config_maps.contains_key(name) {
            return Err(ClusterError::Api(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!("configmaps \"{name}\" already exists"),
                reason: "AlreadyExists".to_string(),
                code: 409,
            })));
        }
        state.config_maps.insert(name.to_string(), data);
        Ok(())
    }

    async fn delete_config_map(&self, name: &str) -> Result<bool, ClusterError> {
        self.record(ClusterCall::DeleteConfigMap { name: name.to_string() });
        Ok(self.inner.lock().config_maps.remove(name).is_some())
    }

    async fn config_map_key(&self, name: &str, key: &str) -> Result<String, ClusterError> {
        let state = self.inner.lock();
        let cm = state.config_maps.get(name).ok_or_else(|| not_found("configmap", name))?;
        cm.get(key).cloned().ok_or_else(|| not_found("configmap key", &format!("{name}/{key}")))
    }

    async fn exec(&self, pod: &str, container: &str, command: &[String]) -> Result<String, ClusterError> {
        self.record(ClusterCall::Exec {
            pod: pod.to_string(),
            container: container.to_string(),
            command: command.to_vec(),
        });
        let mut state = self.inner.lock();
        let key = (pod.to_string(), container.to_string());
        let words: Vec<&str> = command.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["pidof", name] => {
                let pids: Vec<String> = state
                    .processes
                    .get(&key)
                    .map(|ps| ps.iter().filter(|p| p.name == *name).map(|p| p.pid.to_string()).collect())
                    .unwrap_or_default();
                if pids.is_empty() {
                    return Err(failed(command, 1, ""));
                }
                Ok(format!("{}\n", pids.join(" ")))
            }
            ["kill", rest @ ..] => {
                let mut pids = Vec::new();
                let mut words = rest.iter();
                while let Some(w) = words.next() {
                    if *w == "-s" {
                        words.next();
                    } else if let Ok(pid) = w.parse::<u32>() {
                        pids.push(pid);
                    }
                }
                if state.kill_resistance > 0 {
                    state.kill_resistance -= 1;
                    return Ok(String::new());
                }
                let procs = state.processes.entry(key).or_default();
                for pid in pids {
                    let Some(idx) = procs.iter().position(|p| p.pid == pid) else {
                        return Err(failed(command, 1, &format!("kill: ({pid}) - No such process")));
                    };
                    procs.remove(idx).exited.cancel();
                }
                Ok(String::new())
            }
            ["mv", from, to] => {
                let from_key = (pod.to_string(), container.to_string(), from.to_string());
                if !state.files.remove(&from_key) {
                    return Err(failed(command, 1, &format!("mv: can't rename '{from}': No such file or directory")));
                }
                state.files.insert((pod.to_string(), container.to_string(), to.to_string()));
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }

    fn exec_background(&self, pod: &str, container: &str, command: &[String]) -> Running {
        self.record(ClusterCall::ExecBackground {
            pod: pod.to_string(),
            container: container.to_string(),
            command: command.to_vec(),
        });
        let mut state = self.inner.lock();
        let (_, exited) = match command {
            [dlv, verb, binary, ..] if dlv == "dlv" && verb == "exec" => {
                let name = binary.rsplit('/').next().unwrap_or(binary).to_string();
                spawn_process(&mut state, pod, container, &name);
                spawn_process(&mut state, pod, container, "dlv")
            }
            _ => {
                let name = command.first().cloned().unwrap_or_default();
                spawn_process(&mut state, pod, container, &name)
            }
        };
        Running::from_future(command.join(" "), async move {
            exited.cancelled().await;
            Ok(String::new())
        })
    }

    async fn copy_to_pod(
        &self,
        pod: &str,
        container: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), ClusterError> {
        self.record(ClusterCall::Copy {
            pod: pod.to_string(),
            container: container.to_string(),
            destination: destination.to_string(),
        });
        if !source.exists() {
            let command = vec!["cp".to_string(), source.display().to_string()];
            return Err(failed(&command, 1, "no such file or directory"));
        }
        self.inner.lock().files.insert((pod.to_string(), container.to_string(), destination.to_string()));
        Ok(())
    }

    async fn port_forward(&self, pod: &str, addr: &ListenAddr, _ready_timeout: Duration) -> Result<Running, ClusterError> {
        self.record(ClusterCall::PortForward { pod: pod.to_string(), addr: addr.to_string() });
        if !self.inner.lock().pods.iter().any(|p| p.name == pod) {
            return Err(not_found("pod", pod));
        }
        Ok(Running::from_future(format!("port-forward {pod} {addr}"), std::future::pending()))
    }

    async fn delete_service(&self, name: &str) -> Result<bool, ClusterError> {
        self.record(ClusterCall::DeleteService { name: name.to_string() });
        Ok(self.inner.lock().services.remove(name))
    }

    async fn shell(&self, pod: &str, container: &str, ready_timeout: Duration) -> Result<(), ClusterError> {
        self.wait_for_pod(pod, super::CONTAINERS_READY, ready_timeout).await?;
        self.record(ClusterCall::Shell { pod: pod.to_string(), container: container.to_string() });
        Ok(())
    }
}
