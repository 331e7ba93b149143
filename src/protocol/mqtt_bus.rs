// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection for the coordinator.
//!
//! [`MqttBus`] owns the single broker connection of the process. Building it
//! spawns the ingestion task, which polls the `rumqttc` event loop and
//! routes every inbound publish through an [`IngestFilter`] into the shared
//! [`TopicStore`]. That task is the store's only writer.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use autohome::protocol::{MqttBus, Publisher};
//! use autohome::store::TopicStore;
//!
//! # async fn example() -> autohome::Result<()> {
//! let store = Arc::new(TopicStore::new("My SVT"));
//! let (bus, ingestion) = MqttBus::builder()
//!     .host("127.0.0.1")
//!     .port(1883)
//!     .build(Arc::clone(&store))
//!     .await?;
//!
//! bus.publish("/set/room3L/Yeelight/power", "on").await?;
//!
//! bus.disconnect().await?;
//! ingestion.abort();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ProtocolError;
use crate::store::TopicStore;

use super::{IngestFilter, Publisher, RetryBackoff};

/// Global counter for generating unique client IDs.
static BUS_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Capacity of the request channel between the client and its event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Configuration for the broker connection.
#[derive(Debug, Clone)]
pub(crate) struct MqttBusConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    client_id: Option<String>,
    subscription: String,
    reconnection: RetryBackoff,
}

impl Default for MqttBusConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(60),
            connection_timeout: Duration::from_secs(10),
            client_id: None,
            subscription: "#".to_string(),
            reconnection: RetryBackoff::default(),
        }
    }
}

/// Connection to the MQTT broker.
///
/// `MqttBus` is cheaply cloneable (via `Arc`); every clone publishes through
/// the same connection.
#[derive(Clone)]
pub struct MqttBus {
    inner: Arc<MqttBusInner>,
}

struct MqttBusInner {
    /// The MQTT async client for publishing.
    client: AsyncClient,
    /// Configuration used for this connection.
    config: MqttBusConfig,
    /// Connection status.
    connected: AtomicBool,
}

impl MqttBus {
    /// Creates a new builder for configuring the broker connection.
    #[must_use]
    pub fn builder() -> MqttBusBuilder {
        MqttBusBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the subscription filter used for ingestion.
    #[must_use]
    pub fn subscription(&self) -> &str {
        &self.inner.config.subscription
    }

    /// Queues the ingestion subscription without waiting.
    ///
    /// Called from the event-loop task itself, where awaiting the request
    /// channel could deadlock.
    fn request_subscription(&self) {
        let filter = &self.inner.config.subscription;
        match self.inner.client.try_subscribe(filter, QoS::AtMostOnce) {
            Ok(()) => tracing::debug!(filter = %filter, "Subscription requested"),
            Err(e) => tracing::warn!(filter = %filter, error = %e, "Failed to request subscription"),
        }
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl Publisher for MqttBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        tracing::debug!(topic = %topic, payload = %payload, "Publishing to bus");

        self.inner
            .client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl std::fmt::Debug for MqttBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBus")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for the broker connection.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use autohome::protocol::{IngestFilter, MqttBus};
/// use autohome::store::TopicStore;
///
/// # async fn example() -> autohome::Result<()> {
/// let store = Arc::new(TopicStore::new("My SVT"));
/// let (bus, _ingestion) = MqttBus::builder()
///     .host("192.168.178.10")
///     .port(1883)
///     .client_id("Client_C")
///     .keep_alive(Duration::from_secs(60))
///     .ingest_filter(IngestFilter::new(["/room", "/garden"]))
///     .build(store)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBusBuilder {
    config: MqttBusConfig,
    filter: IngestFilter,
}

impl MqttBusBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 60 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets how long `build` waits for the broker to accept the connection
    /// (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets a fixed client ID instead of a generated one.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Sets the subscription filter (default: `#`).
    #[must_use]
    pub fn subscription(mut self, filter: impl Into<String>) -> Self {
        self.config.subscription = filter.into();
        self
    }

    /// Sets which inbound topics are stored.
    #[must_use]
    pub fn ingest_filter(mut self, filter: IngestFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the retry pacing for the event loop.
    #[must_use]
    pub fn reconnection(mut self, backoff: RetryBackoff) -> Self {
        self.config.reconnection = backoff;
        self
    }

    /// Connects to the broker and starts ingesting into `store`.
    ///
    /// Returns the bus handle and the ingestion task. The task runs until
    /// the retry backoff gives up.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(
        self,
        store: Arc<TopicStore>,
    ) -> Result<(MqttBus, JoinHandle<()>), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self.config.client_id.clone().unwrap_or_else(|| {
            let counter = BUS_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("autohome_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        let bus = MqttBus {
            inner: Arc::new(MqttBusInner {
                client,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
            }),
        };

        // Channel to signal when ConnAck is received
        let (connack_tx, connack_rx) = oneshot::channel();

        let bus_clone = bus.clone();
        let filter = self.filter;
        let ingestion = tokio::spawn(async move {
            handle_bus_events(event_loop, bus_clone, store, filter, Some(connack_tx)).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
                Ok((bus, ingestion))
            }
            Ok(Err(_)) => {
                ingestion.abort();
                Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated before connecting".to_string(),
                ))
            }
            Err(_) => {
                ingestion.abort();
                tracing::warn!(
                    host = %self.config.host,
                    port = %self.config.port,
                    "No ConnAck from MQTT broker"
                );
                Err(ProtocolError::Timeout(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }
}

/// Polls the event loop and feeds inbound publishes into the store.
async fn handle_bus_events(
    mut event_loop: EventLoop,
    bus: MqttBus,
    store: Arc<TopicStore>,
    filter: IngestFilter,
    connack_tx: Option<oneshot::Sender<()>>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = connack_tx;
    let mut attempt: u32 = 0;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                bus.inner.connected.store(true, Ordering::Release);
                attempt = 0;
                // Clean sessions drop subscriptions, so ask again on every connect
                bus.request_subscription();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload);
                filter.route(&store, &publish.topic, &payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker sent disconnect");
                bus.inner.connected.store(false, Ordering::Release);
            }
            Ok(_) => {}
            Err(e) => {
                bus.inner.connected.store(false, Ordering::Release);
                let backoff = bus.inner.config.reconnection;
                if !backoff.allows(attempt) {
                    tracing::error!(error = %e, attempt, "MQTT event loop failed, giving up");
                    break;
                }
                let delay = backoff.delay(attempt);
                attempt = attempt.saturating_add(1);
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "MQTT connection lost, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
