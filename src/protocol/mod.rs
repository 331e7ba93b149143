// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus plumbing: inbound routing into the store and outbound publishing.
//!
//! The bridges never talk to MQTT directly. They publish through the
//! [`Publisher`] trait, which is implemented by:
//!
//! - [`MqttBus`]: the real broker connection (feature `mqtt`)
//! - [`RecordingPublisher`]: an in-memory recorder for tests
//! - [`DryRunPublisher`]: logs and drops, for dry runs
//!
//! Inbound messages are filtered by [`IngestFilter`] before they reach the
//! [`TopicStore`](crate::store::TopicStore).

mod backoff;
mod ingest_filter;
#[cfg(feature = "mqtt")]
mod mqtt_bus;
mod recording;

pub use backoff::RetryBackoff;
pub use ingest_filter::IngestFilter;
#[cfg(feature = "mqtt")]
pub use mqtt_bus::{MqttBus, MqttBusBuilder};
pub use recording::{DryRunPublisher, PublishedMessage, RecordingPublisher};

use std::future::Future;

use crate::error::ProtocolError;

/// Sink for outbound bus messages.
///
/// Publishing is fire-and-forget: an `Ok` means the message was handed to
/// the transport, not that anyone received it.
pub trait Publisher: Send + Sync {
    /// Publishes `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message cannot be handed to the bus.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}
