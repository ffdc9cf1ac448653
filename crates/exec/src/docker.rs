// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docker` invocations for building and publishing the patch image.

use crate::cmd::Cmd;
use podbug_core::{ImageRef, Platform};
use std::path::Path;

/// Format string that makes `docker image inspect` print `os/arch`.
pub const PLATFORM_FORMAT: &str = "{{.Os}}/{{.Architecture}}";

#[derive(Debug, Clone)]
pub struct DockerCmd {
    program: String,
}

impl Default for DockerCmd {
    fn default() -> Self {
        Self { program: "docker".to_string() }
    }
}

impl DockerCmd {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Build `dir` with the original image passed as the `IMAGE` build arg.
    pub fn build(&self, dir: &Path, base_image: &str, tag: &ImageRef, platform: &Platform) -> Cmd {
        Cmd::new(&self.program).args([
            "build".to_string(),
            dir.display().to_string(),
            "--build-arg".to_string(),
            format!("IMAGE={base_image}"),
            "-t".to_string(),
            tag.to_string(),
            "--platform".to_string(),
            platform.to_string(),
        ])
    }

    pub fn push(&self, image: &ImageRef) -> Cmd {
        Cmd::new(&self.program).args(["push".to_string(), image.to_string()])
    }

    pub fn pull(&self, image: &str) -> Cmd {
        Cmd::new(&self.program).args(["pull", image])
    }

    pub fn inspect_platform(&self, image: &str) -> Cmd {
        Cmd::new(&self.program).args(["image", "inspect", "-f", PLATFORM_FORMAT, image])
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
