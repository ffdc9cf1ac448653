// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{connect, TargetArgs};
use crate::exit_error::ExitError;
use crate::GlobalArgs;
use anyhow::Result;
use clap::Args;
use podbug_adapters::ClusterError;
use podbug_engine::Error;

#[derive(Args, Debug, Clone)]
pub struct ShellArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

pub async fn run(args: ShellArgs, global: &GlobalArgs) -> Result<()> {
    let podbug = connect(&global.namespace).await?;
    podbug.shell(&args.target.target()).await.map_err(shell_exit)
}

/// The shell's own exit status becomes podbug's, without an error message.
fn shell_exit(err: Error) -> anyhow::Error {
    if let Error::Cluster(ClusterError::Exec(exec)) = &err {
        if let Some(code) = exec.exit_code().filter(|c| *c != 0) {
            return ExitError::new(code, String::new()).into();
        }
    }
    err.into()
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
