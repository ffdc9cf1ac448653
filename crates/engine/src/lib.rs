// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podbug-engine: patch/rollback state machine and debug session orchestrator
//!
//! Everything here is generic over the adapter traits, so the same code runs
//! against a live cluster and against the in-memory fakes in tests.

mod error;
mod retry;

pub mod env;
pub mod health;
pub mod interrupt;
pub mod patch;
pub mod pids;
pub mod podbug;
pub mod session;
pub mod source;
pub mod validate;

pub use env::Timing;
pub use error::Error;
pub use interrupt::{listen_for_interrupts, ChannelSource, Control, CtrlC, Debouncer, InterruptSource, Phase};
pub use patch::{PatchReport, PatchRequest, Patcher, PATCH_DOCKERFILE};
pub use podbug::{DelveRequest, Podbug, Target};
pub use session::{Cleaner, DebugSession, Deps, SessionConfig};
pub use source::SourceTarget;
