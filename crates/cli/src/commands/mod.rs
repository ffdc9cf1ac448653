// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod delve;
pub mod patch;
pub mod rollback;
pub mod shell;

use anyhow::{Context, Result};
use clap::Args;
use podbug_adapters::{DockerImages, GoToolchain, KubeCluster, VsCode};
use podbug_core::SystemClock;
use podbug_engine::{env, Deps, Podbug, Target, Timing};

/// Engine wired to kubectl, docker, go and VS Code.
pub type LivePodbug = Podbug<KubeCluster, DockerImages, GoToolchain, VsCode, SystemClock>;

pub async fn connect(namespace: &str) -> Result<LivePodbug> {
    tracing::debug!(namespace, "connecting to cluster");
    let cluster = KubeCluster::new(namespace).await.context("connecting to cluster")?;
    let deps = Deps { cluster, images: DockerImages::new(), toolchain: GoToolchain::new(), editor: VsCode::new() };
    Ok(Podbug::new(deps, SystemClock, Timing::from_env()).with_repository(env::image_repository()))
}

/// Deployment plus optional pod and container selection.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Deployment name
    pub deployment: String,

    /// Pod to use (default: most recently started running pod)
    #[arg(short, long)]
    pub pod: Option<String>,

    /// Container to use (default: the deployment name)
    #[arg(short, long)]
    pub container: Option<String>,
}

impl TargetArgs {
    pub fn target(&self) -> Target {
        Target { deployment: self.deployment.clone(), pod: self.pod.clone(), container: self.container.clone() }
    }
}
