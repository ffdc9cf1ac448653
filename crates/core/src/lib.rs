// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! podbug-core: domain types shared by every podbug crate
//!
//! Nothing in here talks to a cluster or spawns a process. The types are
//! pure views over cluster-visible state (a freshly fetched `Deployment`)
//! plus the small value types the patch and debug flows pass around.

pub mod macros;

pub mod clock;
pub mod image;
pub mod listen;
pub mod marker;
pub mod mount;
pub mod validation;
pub mod workload;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use image::{ImageRef, Platform};
pub use listen::ListenAddr;
pub use marker::{is_patched, PatchMarker};
pub use mount::{validate_mounts, validate_path, Mount};
pub use validation::{validate_resource, ValidationError};
pub use workload::{snapshot_name, ContainerArgs, WorkloadRef};
