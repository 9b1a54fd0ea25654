// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry for record store calls.

/// Errors that can tell whether another attempt may succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Run `op` up to `max_attempts` times, retrying only transient failures.
///
/// There is no backoff: the ceiling is the only limit. The last error is
/// returned once attempts are exhausted, and non-transient errors are
/// returned immediately.
pub fn with_retries<T, E, F>(max_attempts: u32, operation: &str, mut op: F) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Transient record store failure, retrying"
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
