// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{connect, rollback};
use crate::GlobalArgs;
use anyhow::Result;
use clap::Args;
use podbug_core::validate_mounts;
use podbug_engine::PatchRequest;

#[derive(Args, Debug, Clone)]
pub struct PatchArgs {
    /// Deployment name
    pub deployment: String,

    /// Container to patch (default: the deployment name)
    #[arg(short, long)]
    pub container: Option<String>,

    /// Base image for the debug image (default: the deployed image)
    #[arg(short, long)]
    pub image: Option<String>,

    /// Host directory to mount, as host_path:mount_path (repeatable)
    #[arg(short, long = "mount", value_name = "HOST:CONTAINER")]
    pub mounts: Vec<String>,

    /// Undo the patch instead of applying it
    #[arg(long)]
    pub rollback: bool,
}

pub async fn run(args: PatchArgs, global: &GlobalArgs) -> Result<()> {
    let mounts = validate_mounts(&global.working_dir()?, &args.mounts)?;
    let podbug = connect(&global.namespace).await?;
    if args.rollback {
        return rollback::roll_back(&podbug, &args.deployment).await;
    }

    let request = PatchRequest { container: args.container, image: args.image, mounts };
    let report = podbug.patch(&args.deployment, &request).await?;
    if report.rolled_back_first {
        println!("rolled back previous patch of {}", args.deployment);
    }
    println!("patched {}/{} with {}", args.deployment, report.container, report.image);
    Ok(())
}
