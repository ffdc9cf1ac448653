// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image build/registry adapter

use async_trait::async_trait;
use podbug_core::{ImageRef, Platform, ValidationError};
use podbug_exec::{DockerCmd, ExecError};
use std::path::Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from image operations
#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("image {image} reports an invalid platform: {source}")]
    Platform { image: String, source: ValidationError },
}

/// Adapter for building, publishing and inspecting container images
#[async_trait]
pub trait ImageAdapter: Clone + Send + Sync + 'static {
    /// `os/arch` the image was built for.
    async fn platform(&self, image: &str) -> Result<Platform, ImageError>;

    /// Build the context in `dir` with `base` as the `IMAGE` build arg.
    async fn build(&self, dir: &Path, base: &str, tag: &ImageRef, platform: &Platform) -> Result<(), ImageError>;

    async fn push(&self, image: &ImageRef) -> Result<(), ImageError>;
}

/// Image adapter shelling out to the `docker` CLI.
#[derive(Clone, Debug, Default)]
pub struct DockerImages {
    docker: DockerCmd,
}

impl DockerImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docker(docker: DockerCmd) -> Self {
        Self { docker }
    }

    async fn inspect(&self, image: &str) -> Result<String, ExecError> {
        self.docker.inspect_platform(image).run(&CancellationToken::new()).await
    }
}

#[async_trait]
impl ImageAdapter for DockerImages {
    async fn platform(&self, image: &str) -> Result<Platform, ImageError> {
        let out = match self.inspect(image).await {
            Ok(out) => out,
            Err(e) => {
                // Not present locally; fetch and retry once.
                tracing::debug!(%image, error = %e, "image not local, pulling");
                self.docker.pull(image).run(&CancellationToken::new()).await?;
                self.inspect(image).await?
            }
        };
        Platform::parse(&out).map_err(|source| ImageError::Platform { image: image.to_string(), source })
    }

    async fn build(&self, dir: &Path, base: &str, tag: &ImageRef, platform: &Platform) -> Result<(), ImageError> {
        tracing::info!(%tag, %base, %platform, "building patch image");
        self.docker.build(dir, base, tag, platform).run(&CancellationToken::new()).await?;
        Ok(())
    }

    async fn push(&self, image: &ImageRef) -> Result<(), ImageError> {
        tracing::info!(%image, "pushing patch image");
        self.docker.push(image).run(&CancellationToken::new()).await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ImageAdapter, ImageError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use podbug_core::{ImageRef, Platform};
    use std::path::Path;
    use std::sync::Arc;

    /// Recorded image call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ImageCall {
        Platform { image: String },
        Build { base: String, tag: String, platform: String, dockerfile: String },
        Push { image: String },
    }

    struct FakeImageState {
        platform: Platform,
        calls: Vec<ImageCall>,
    }

    /// Fake image adapter for testing
    #[derive(Clone)]
    pub struct FakeImages {
        inner: Arc<Mutex<FakeImageState>>,
    }

    impl Default for FakeImages {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeImageState {
                    platform: Platform::new("linux", "amd64"),
                    calls: Vec::new(),
                })),
            }
        }
    }

    impl FakeImages {
        pub fn new() -> Self {
            Self::default()
        }

        /// Platform every inspected image reports.
        pub fn set_platform(&self, platform: Platform) {
            self.inner.lock().platform = platform;
        }

        pub fn calls(&self) -> Vec<ImageCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl ImageAdapter for FakeImages {
        async fn platform(&self, image: &str) -> Result<Platform, ImageError> {
            let mut state = self.inner.lock();
            state.calls.push(ImageCall::Platform { image: image.to_string() });
            Ok(state.platform.clone())
        }

        async fn build(&self, dir: &Path, base: &str, tag: &ImageRef, platform: &Platform) -> Result<(), ImageError> {
            let dockerfile = std::fs::read_to_string(dir.join("Dockerfile")).unwrap_or_default();
            self.inner.lock().calls.push(ImageCall::Build {
                base: base.to_string(),
                tag: tag.to_string(),
                platform: platform.to_string(),
                dockerfile,
            });
            Ok(())
        }

        async fn push(&self, image: &ImageRef) -> Result<(), ImageError> {
            self.inner.lock().calls.push(ImageCall::Push { image: image.to_string() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeImages, ImageCall};

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
