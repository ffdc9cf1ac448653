// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{connect, TargetArgs};
use crate::GlobalArgs;
use anyhow::Result;
use clap::Args;
use podbug_core::{validate_path, ListenAddr, SystemClock};
use podbug_engine::{listen_for_interrupts, CtrlC, DelveRequest, Timing};

#[derive(Args, Debug, Clone)]
pub struct DelveArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Go source file or package directory to build
    #[arg(long, default_value = ".")]
    pub source: String,

    /// Program arguments (default: the deployed container's arguments)
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Local address the debugger is exposed on; port 0 picks a free port
    #[arg(long, default_value = "127.0.0.1:2345")]
    pub listen: String,

    /// Start the program instead of halting at entry
    #[arg(long = "continue")]
    pub continue_on_start: bool,

    /// Open VS Code attached to the debugger
    #[arg(long)]
    pub vscode: bool,

    /// Only remove debugger leftovers from the pod
    #[arg(long)]
    pub cleanup: bool,
}

impl DelveArgs {
    pub fn program_args(&self) -> Vec<String> {
        self.args.as_deref().map(split_args).unwrap_or_default()
    }
}

fn split_args(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

pub async fn run(args: DelveArgs, global: &GlobalArgs) -> Result<()> {
    let target = args.target.target();
    if args.cleanup {
        let podbug = connect(&global.namespace).await?;
        podbug.cleanup(&target).await?;
        println!("cleaned up {}", target.deployment);
        return Ok(());
    }

    let listen = ListenAddr::parse(&args.listen)?;
    let source = validate_path(&global.working_dir()?, &args.source)?;
    let podbug = connect(&global.namespace).await?;
    let request = DelveRequest {
        target,
        source,
        args: args.program_args(),
        listen,
        continue_on_start: args.continue_on_start,
        launch_editor: args.vscode,
    };
    let controls = listen_for_interrupts(CtrlC, SystemClock, Timing::from_env().reload_debounce);
    podbug.delve(request, controls).await?;
    Ok(())
}

#[cfg(test)]
#[path = "delve_tests.rs"]
mod tests;
