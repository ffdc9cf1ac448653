// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podbug-exec: external process execution and typed CLI builders
//!
//! [`Cmd`] wraps `tokio::process` with output fan-out, lifecycle hooks and
//! blocking or background execution. [`KubectlCmd`], [`DockerCmd`] and
//! [`GoCmd`] build the specific invocations the patch and debug flows need.

mod cmd;
mod docker;
mod error;
mod go;
mod kubectl;
mod parse;
mod process;

pub use cmd::{Cmd, LineSink};
pub use docker::{DockerCmd, PLATFORM_FORMAT};
pub use error::ExecError;
pub use go::{GoCmd, DEBUG_GCFLAGS};
pub use kubectl::KubectlCmd;
pub use parse::{parse_latest_revision, parse_pids, ParseError};
pub use process::{ProcessHandle, Running};
