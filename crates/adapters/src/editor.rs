// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Editor launch with a generated remote-attach configuration

use async_trait::async_trait;
use podbug_exec::{Cmd, ExecError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Extension URL that starts a debug session from a serialized launch config.
pub const DEBUG_LAUNCHER_URL: &str = "vscode://fabiospampinato.vscode-debug-launcher/launch";

/// Errors from editor launch
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("editor not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("invalid attach config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote attach descriptor handed to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachConfig {
    pub name: String,
    pub request: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub remote_path: String,
    pub host: String,
    pub port: u16,
}

impl AttachConfig {
    pub fn new(name: impl Into<String>, remote_path: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            request: "attach",
            kind: "go",
            mode: "remote",
            remote_path: remote_path.into(),
            host: host.into(),
            port,
        }
    }

    /// Debug-launcher URL carrying this config as a query argument.
    pub fn launch_url(&self) -> Result<String, EditorError> {
        let json = serde_json::to_string(self)?;
        let encoded: String = url::form_urlencoded::byte_serialize(json.as_bytes()).collect();
        Ok(format!("{DEBUG_LAUNCHER_URL}?args={encoded}"))
    }
}

/// Opens an editor and starts a remote-attach session in it.
#[async_trait]
pub trait EditorLauncher: Clone + Send + Sync + 'static {
    async fn launch(&self, workspace: &Path, config: &AttachConfig) -> Result<(), EditorError>;
}

/// Visual Studio Code via the `code` CLI and the platform URL opener.
#[derive(Debug, Clone)]
pub struct VsCode {
    code: String,
    opener: String,
    ready_attempts: u32,
    ready_backoff: Duration,
}

impl Default for VsCode {
    fn default() -> Self {
        let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
        Self { code: "code".to_string(), opener: opener.to_string(), ready_attempts: 10, ready_backoff: Duration::from_secs(1) }
    }
}

impl VsCode {
    pub fn new() -> Self {
        Self::default()
    }

    podbug_core::setters! {
        into { code: String, opener: String }
        set { ready_attempts: u32, ready_backoff: Duration }
    }

    async fn wait_ready(&self) -> Result<(), EditorError> {
        for attempt in 1..=self.ready_attempts {
            match Cmd::new(&self.code).arg("-s").stdin_null().run(&CancellationToken::new()).await {
                Ok(_) => return Ok(()),
                Err(e) => tracing::debug!(attempt, error = %e, "editor not ready"),
            }
            tokio::time::sleep(self.ready_backoff).await;
        }
        Err(EditorError::NotReady { attempts: self.ready_attempts })
    }
}

/// A `*.code-workspace` file directly inside `dir`, else `dir` itself.
pub fn workspace_target(dir: &Path) -> PathBuf {
    let found = std::fs::read_dir(dir).ok().and_then(|entries| {
        entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|ext| ext == "code-workspace"))
    });
    found.unwrap_or_else(|| dir.to_path_buf())
}

/// `remotePath` for an attach config rooted at `dir`.
///
/// A workspace file opens without a single workspace folder, so the path is
/// spelled out; otherwise the editor's own variable resolves it.
pub fn remote_path_for(dir: &Path) -> String {
    if workspace_target(dir) == dir {
        "${workspaceFolder}".to_string()
    } else {
        dir.display().to_string()
    }
}

#[async_trait]
impl EditorLauncher for VsCode {
    async fn launch(&self, workspace: &Path, config: &AttachConfig) -> Result<(), EditorError> {
        let target = workspace_target(workspace);
        tracing::info!(target = %target.display(), "opening editor");
        Cmd::new(&self.code).arg(target.display().to_string()).stdin_null().run(&CancellationToken::new()).await?;
        self.wait_ready().await?;
        let url = config.launch_url()?;
        Cmd::new(&self.opener).arg(url).stdin_null().run(&CancellationToken::new()).await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{AttachConfig, EditorError, EditorLauncher};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded launch
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EditorLaunch {
        pub workspace: PathBuf,
        pub config: AttachConfig,
    }

    /// Fake editor for testing
    #[derive(Clone, Default)]
    pub struct FakeEditor {
        launches: Arc<Mutex<Vec<EditorLaunch>>>,
    }

    impl FakeEditor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn launches(&self) -> Vec<EditorLaunch> {
            self.launches.lock().clone()
        }
    }

    #[async_trait]
    impl EditorLauncher for FakeEditor {
        async fn launch(&self, workspace: &Path, config: &AttachConfig) -> Result<(), EditorError> {
            self.launches.lock().push(EditorLaunch { workspace: workspace.to_path_buf(), config: config.clone() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{EditorLaunch, FakeEditor};

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
