// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiler toolchain adapter

use async_trait::async_trait;
use podbug_core::Platform;
use podbug_exec::{ExecError, GoCmd};
use std::path::Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from toolchain operations
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Adapter for compiling the debugged program
#[async_trait]
pub trait Toolchain: Clone + Send + Sync + 'static {
    /// Compile `package` under `module_root` for `platform` into `output`,
    /// with optimisations and inlining disabled.
    async fn build(
        &self,
        module_root: &Path,
        package: &str,
        output: &Path,
        platform: &Platform,
    ) -> Result<(), ToolchainError>;
}

/// Toolchain adapter running `go build`.
#[derive(Clone, Debug, Default)]
pub struct GoToolchain {
    go: GoCmd,
}

impl GoToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_go(go: GoCmd) -> Self {
        Self { go }
    }
}

#[async_trait]
impl Toolchain for GoToolchain {
    async fn build(
        &self,
        module_root: &Path,
        package: &str,
        output: &Path,
        platform: &Platform,
    ) -> Result<(), ToolchainError> {
        tracing::info!(module = %module_root.display(), %package, %platform, "building debug binary");
        self.go.build(module_root, package, output, platform).run(&CancellationToken::new()).await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Toolchain, ToolchainError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use podbug_core::Platform;
    use podbug_exec::ExecError;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded build
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BuildCall {
        pub module_root: PathBuf,
        pub package: String,
        pub platform: Platform,
    }

    #[derive(Default)]
    struct FakeToolchainState {
        calls: Vec<BuildCall>,
        fail: bool,
    }

    /// Fake toolchain for testing; writes a placeholder binary.
    #[derive(Clone, Default)]
    pub struct FakeToolchain {
        inner: Arc<Mutex<FakeToolchainState>>,
    }

    impl FakeToolchain {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every following build fail.
        pub fn set_fail(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        pub fn calls(&self) -> Vec<BuildCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Toolchain for FakeToolchain {
        async fn build(
            &self,
            module_root: &Path,
            package: &str,
            output: &Path,
            platform: &Platform,
        ) -> Result<(), ToolchainError> {
            let fail = {
                let mut state = self.inner.lock();
                state.calls.push(BuildCall {
                    module_root: module_root.to_path_buf(),
                    package: package.to_string(),
                    platform: platform.clone(),
                });
                state.fail
            };
            if fail {
                return Err(ToolchainError::Exec(ExecError::Failed {
                    command: format!("go build {package}"),
                    code: Some(1),
                    output: "syntax error".to_string(),
                }));
            }
            std::fs::write(output, b"\x7fELF").map_err(|source| {
                ToolchainError::Exec(ExecError::SpawnFailed { command: "go build".to_string(), source })
            })?;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BuildCall, FakeToolchain};

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
