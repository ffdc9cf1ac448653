// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podbug-adapters: trait seams over everything outside the process
//!
//! Each adapter has a real implementation and, behind the `test-support`
//! feature, an in-memory fake recording the calls made against it.

pub mod cluster;
pub mod delve;
pub mod editor;
pub mod image;
pub mod toolchain;

pub use cluster::{ClusterAdapter, ClusterError, KubeCluster};
pub use delve::{DebuggerState, DelveClient, DelveCommand, DelveError, DelveServer, Health};
pub use editor::{remote_path_for, AttachConfig, EditorError, EditorLauncher, VsCode};
pub use image::{DockerImages, ImageAdapter, ImageError};
pub use toolchain::{GoToolchain, Toolchain, ToolchainError};

#[cfg(any(test, feature = "test-support"))]
pub use cluster::{ClusterCall, FakeCluster};
#[cfg(any(test, feature = "test-support"))]
pub use delve::FakeDelveServer;
#[cfg(any(test, feature = "test-support"))]
pub use editor::{EditorLaunch, FakeEditor};
#[cfg(any(test, feature = "test-support"))]
pub use image::{FakeImages, ImageCall};
#[cfg(any(test, feature = "test-support"))]
pub use toolchain::{BuildCall, FakeToolchain};
