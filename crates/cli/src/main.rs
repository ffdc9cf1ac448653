// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podbug: debug a Go process inside a live Kubernetes pod

mod color;
mod commands;
mod exit_error;
mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PODBUG_GIT_HASH"), ")");

#[derive(Parser)]
#[command(name = "podbug", version = VERSION, styles = color::styles())]
#[command(about = "Patch a deployment for debugging, then build, deploy and debug it with Delve")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags accepted by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Namespace of the deployment
    #[arg(short, long, global = true, default_value = "default")]
    pub namespace: String,

    /// Trace-level logging for podbug crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Directory relative mount and source paths resolve against
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,
}

impl GlobalArgs {
    pub fn working_dir(&self) -> Result<PathBuf> {
        self.dir.canonicalize().with_context(|| format!("working directory {}", self.dir.display()))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Put a deployment into debug mode
    Patch(commands::patch::PatchArgs),
    /// Restore the deployment as it was before patching
    Rollback(commands::rollback::RollbackArgs),
    /// Open a shell in the patched container
    Shell(commands::shell::ShellArgs),
    /// Build, deploy and debug the program in the patched container
    Delve(commands::delve::DelveArgs),
    /// Print the version
    Version,
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Patch(args) => commands::patch::run(args, &cli.global).await,
        Command::Rollback(args) => commands::rollback::run(args, &cli.global).await,
        Command::Shell(args) => commands::shell::run(args, &cli.global).await,
        Command::Delve(args) => commands::delve::run(args, &cli.global).await,
        Command::Version => {
            println!("podbug {VERSION}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.global.verbose, cli.global.json_log) {
        eprintln!("{} {e:#}", color::error_label());
    }

    if let Err(e) = run(cli).await {
        let message = format!("{e:#}");
        if !message.is_empty() {
            eprintln!("{} {message}", color::error_label());
        }
        std::process::exit(exit_error::exit_code(&e));
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
