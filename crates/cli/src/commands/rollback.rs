// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{connect, LivePodbug};
use crate::GlobalArgs;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct RollbackArgs {
    /// Deployment name
    pub deployment: String,
}

pub async fn run(args: RollbackArgs, global: &GlobalArgs) -> Result<()> {
    let podbug = connect(&global.namespace).await?;
    roll_back(&podbug, &args.deployment).await
}

pub async fn roll_back(podbug: &LivePodbug, deployment: &str) -> Result<()> {
    let revision = podbug.rollback(deployment).await?;
    println!("rolled back {deployment} to revision {revision}");
    Ok(())
}
