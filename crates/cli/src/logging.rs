// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log output goes to stderr so it never mixes with command output.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 5] = ["podbug", "podbug_core", "podbug_exec", "podbug_adapters", "podbug_engine"];

/// Filter directive: `--verbose` traces podbug crates, otherwise
/// `PODBUG_LOG`, then `RUST_LOG`, then `info`.
pub fn directive(verbose: bool, podbug_log: Option<&str>, rust_log: Option<&str>) -> String {
    if verbose {
        let crates: Vec<String> = CRATES.iter().map(|c| format!("{c}=trace")).collect();
        return format!("info,{}", crates.join(","));
    }
    podbug_log.or(rust_log).filter(|s| !s.trim().is_empty()).unwrap_or("info").to_string()
}

pub fn init(verbose: bool, json: bool) -> anyhow::Result<()> {
    let podbug_log = std::env::var("PODBUG_LOG").ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = directive(verbose, podbug_log.as_deref(), rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(verbose);
    let result = if json { builder.json().try_init() } else { builder.compact().try_init() };
    result.map_err(|e| anyhow!("logging setup failed: {e}"))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
