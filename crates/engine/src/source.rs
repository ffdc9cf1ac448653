// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locate the Go module and package to build.

use crate::Error;
use std::path::{Path, PathBuf};

/// File marking a module root.
pub const MODULE_FILE: &str = "go.mod";

/// What to compile: a package path relative to its module root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
    pub module_root: PathBuf,
    /// `./`-prefixed package path, or `.` for the root package.
    pub package: String,
}

/// Resolve an existing, absolute source file or directory.
///
/// Walks parent directories up to the filesystem root looking for `go.mod`.
pub fn resolve(source: &Path) -> Result<SourceTarget, Error> {
    let start = if source.is_dir() { source } else { source.parent().unwrap_or(source) };
    let module_root = start
        .ancestors()
        .find(|dir| dir.join(MODULE_FILE).is_file())
        .ok_or_else(|| Error::NoModuleRoot { path: source.to_path_buf() })?;

    let package = match source.strip_prefix(module_root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => ".".to_string(),
    };
    Ok(SourceTarget { module_root: module_root.to_path_buf(), package })
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
