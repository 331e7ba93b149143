// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publishers that never reach a broker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::ProtocolError;

use super::Publisher;

/// A message handed to a [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Message payload.
    pub payload: String,
}

/// Publisher that keeps every message in memory instead of sending it.
///
/// Clones share the same record, which grows with every publish until
/// [`take`](Self::take) drains it. Meant for tests; long-running dry runs
/// use [`DryRunPublisher`].
///
/// # Examples
///
/// ```
/// use autohome::protocol::{Publisher, RecordingPublisher};
///
/// # async fn example() {
/// let publisher = RecordingPublisher::new();
/// publisher.publish("/room1L/lights", "1").await.unwrap();
///
/// let sent = publisher.published();
/// assert_eq!(sent[0].topic, "/room1L/lights");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    inner: Arc<RecordingInner>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    messages: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every message published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.inner.messages.lock().clone()
    }

    /// Removes and returns every recorded message.
    pub fn take(&self) -> Vec<PublishedMessage> {
        std::mem::take(&mut *self.inner.messages.lock())
    }

    /// Makes subsequent publishes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::Release);
    }
}

impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        if self.inner.failing.load(Ordering::Acquire) {
            return Err(ProtocolError::ConnectionFailed(
                "recording publisher set to fail".to_string(),
            ));
        }

        tracing::debug!(topic = %topic, payload = %payload, "Recorded publish");
        self.inner.messages.lock().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

/// Publisher that only logs what would have been sent.
///
/// Holds no state, so a dry run can go on indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPublisher;

impl Publisher for DryRunPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        tracing::info!(topic = %topic, payload = %payload, "Dry run, not publishing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let publisher = RecordingPublisher::new();
        publisher.publish("a", "1").await.unwrap();
        publisher.publish("b", "2").await.unwrap();

        let topics: Vec<_> = publisher.published().into_iter().map(|m| m.topic).collect();
        assert_eq!(topics, ["a", "b"]);
    }

    #[tokio::test]
    async fn clones_share_record() {
        let publisher = RecordingPublisher::new();
        let clone = publisher.clone();
        clone.publish("/room1L/lights", "0").await.unwrap();

        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn failing_mode_rejects_and_records_nothing() {
        let publisher = RecordingPublisher::new();
        publisher.set_failing(true);
        assert!(publisher.publish("a", "1").await.is_err());
        assert!(publisher.published().is_empty());

        publisher.set_failing(false);
        assert!(publisher.publish("a", "1").await.is_ok());
    }

    #[tokio::test]
    async fn take_drains() {
        let publisher = RecordingPublisher::new();
        publisher.publish("a", "1").await.unwrap();
        assert_eq!(publisher.take().len(), 1);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn dry_run_accepts_everything_and_keeps_nothing() {
        let publisher = DryRunPublisher;
        for cycle in 0..1000 {
            let payload = format!("field1={cycle}");
            assert!(publisher.publish("1234/publish/ABCD", &payload).await.is_ok());
        }
        assert_eq!(std::mem::size_of::<DryRunPublisher>(), 0);
    }
}
