// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `go build` with debugger-friendly flags.

use crate::cmd::Cmd;
use podbug_core::Platform;
use std::path::Path;

/// Disable optimisations and inlining so breakpoints land on source lines.
pub const DEBUG_GCFLAGS: &str = "-gcflags=all=-N -l";

#[derive(Debug, Clone)]
pub struct GoCmd {
    program: String,
}

impl Default for GoCmd {
    fn default() -> Self {
        Self { program: "go".to_string() }
    }
}

impl GoCmd {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Cross-compile `package` (relative to `module_root`) into `output`.
    pub fn build(&self, module_root: &Path, package: &str, output: &Path, platform: &Platform) -> Cmd {
        Cmd::new(&self.program)
            .args([
                "build".to_string(),
                "-o".to_string(),
                output.display().to_string(),
                DEBUG_GCFLAGS.to_string(),
                package.to_string(),
            ])
            .cwd(module_root)
            .env("GOOS", &platform.os)
            .env("GOARCH", &platform.arch)
            .env("CGO_ENABLED", "0")
    }
}
