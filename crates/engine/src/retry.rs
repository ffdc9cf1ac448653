// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded retry with fixed backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Call `f` with attempt numbers `1..=attempts` until it succeeds.
///
/// Sleeps `backoff` between attempts and returns the last error. At least one
/// attempt is always made.
pub(crate) async fn retry<T, E, F, Fut>(what: &str, attempts: u32, backoff: Duration, mut f: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match f(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::debug!(what, attempt, attempts, error = %e, "retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
