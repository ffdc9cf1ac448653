// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container image references and target platforms

use crate::validation::ValidationError;
use std::fmt;

pub const DEFAULT_TAG: &str = "latest";

/// `[repository/]name[:tag]`
///
/// The repository keeps everything before the last `/`, so registry ports
/// (`host:5000/team/app:v1`) land there intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: Option<String>,
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: Option<&str>, name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.filter(|r| !r.is_empty()).map(str::to_string),
            name: name.into(),
            tag: tag.into(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::Image(s.to_string());
        let (repository, last) = match s.rsplit_once('/') {
            Some((repo, last)) if !repo.is_empty() => (Some(repo), last),
            Some(_) => return Err(invalid()),
            None => (None, s),
        };
        let (name, tag) = match last.split_once(':') {
            Some((name, tag)) if !tag.is_empty() && !tag.contains(':') => (name, tag),
            Some(_) => return Err(invalid()),
            None => (last, DEFAULT_TAG),
        };
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(repository, name, tag))
    }

    /// Reference without the tag, as passed to `docker push <name>:<tag>`.
    pub fn without_tag(&self) -> String {
        match &self.repository {
            Some(repo) => format!("{repo}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.without_tag(), self.tag)
    }
}

/// `os/arch` of an image, used as `GOOS`/`GOARCH` and `docker build --platform`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self { os: os.into(), arch: arch.into() }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().split('/').collect::<Vec<_>>().as_slice() {
            [os, arch] if !os.is_empty() && !arch.is_empty() => Ok(Self::new(*os, *arch)),
            _ => Err(ValidationError::Platform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
