// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host directories bind-mounted into the patched container

use crate::validation::ValidationError;
use std::path::{Path, PathBuf};

/// A validated `host:container` mount pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Absolute, canonical host path that exists.
    pub host_path: PathBuf,
    /// Absolute path inside the container.
    pub mount_path: String,
}

impl Mount {
    /// Volume name used for the `i`th mount in the patch.
    pub fn volume_name(index: usize) -> String {
        format!("patch-mount-{index}")
    }
}

/// Parse and validate `host:container` mount specs.
///
/// Relative host paths resolve against `wd`.
pub fn validate_mounts(wd: &Path, specs: &[String]) -> Result<Vec<Mount>, ValidationError> {
    specs
        .iter()
        .map(|spec| {
            let pieces: Vec<&str> = spec.split(':').collect();
            let [host, mount_path] = pieces.as_slice() else {
                return Err(ValidationError::MountFormat { mount: spec.clone() });
            };
            let host_path = validate_path(wd, host).map_err(|e| ValidationError::MountHostPath {
                mount: spec.clone(),
                reason: e.to_string(),
            })?;
            if !mount_path.starts_with('/') {
                return Err(ValidationError::MountPathNotAbsolute { mount: spec.clone() });
            }
            Ok(Mount { host_path, mount_path: mount_path.to_string() })
        })
        .collect()
}

/// Resolve `path` against `wd` and require that it exists.
pub fn validate_path(wd: &Path, path: &str) -> Result<PathBuf, ValidationError> {
    let joined = wd.join(path);
    std::fs::canonicalize(&joined)
        .map_err(|e| ValidationError::Path { path: joined.display().to_string(), reason: e.to_string() })
}

#[cfg(test)]
#[path = "mount_tests.rs"]
mod tests;
