// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retry pacing for the bus ingestion loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Doubling retry delay after a lost broker connection.
///
/// This is also the `reconnection` section of the configuration file, so
/// the delays are kept in milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use autohome::protocol::RetryBackoff;
///
/// let backoff = RetryBackoff {
///     initial_delay_ms: 500,
///     max_delay_ms: 3000,
///     max_retries: Some(4),
/// };
///
/// assert_eq!(backoff.delay(0), Duration::from_millis(500));
/// assert_eq!(backoff.delay(2), Duration::from_millis(2000));
/// assert_eq!(backoff.delay(3), Duration::from_millis(3000));
/// assert!(backoff.allows(3));
/// assert!(!backoff.allows(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryBackoff {
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound for any delay.
    pub max_delay_ms: u64,
    /// Consecutive failed attempts tolerated; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl RetryBackoff {
    /// Gives up after `max_retries` consecutive failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Returns the wait before retry number `attempt` (0-based).
    ///
    /// The delay doubles per attempt and saturates at `max_delay_ms`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Returns `true` if retry number `attempt` may still be made.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_retries.is_none_or(|max| attempt < max)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            max_retries: None,
        }
    }
}
