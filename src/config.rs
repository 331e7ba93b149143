// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration.
//!
//! The configuration is a JSON document. Every field has a default, so an
//! empty object (or no file at all) describes the stock installation:
//!
//! ```json
//! {
//!   "home_name": "My SVT",
//!   "broker": { "host": "127.0.0.1", "port": 1883, "client_id": "Client_C" },
//!   "command_channel": { "listen_addr": "0.0.0.0:12350" },
//!   "cloud_feed": {
//!     "room_delay_secs": 20,
//!     "cycle_delay_secs": 900,
//!     "rooms": { "room2R": { "channel_id": "1234", "write_key": "ABCD" } }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cloud::{
    ChannelCredentials, CloudMapping, DEFAULT_SENSOR_CATEGORY, FeedSchedule,
};
use crate::command::{ActuatorCommand, ChannelLimits, default_actuators};
use crate::error::ConfigError;
use crate::protocol::{IngestFilter, RetryBackoff};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Name shown in the status header.
    pub home_name: String,
    /// Broker connection.
    pub broker: BrokerConfig,
    /// Topic prefixes stored from the bus.
    pub ingest_prefixes: Vec<String>,
    /// Command channel server.
    pub command_channel: CommandChannelConfig,
    /// Cloud feed loop.
    pub cloud_feed: CloudFeedConfig,
    /// Direct actuator commands.
    pub actuators: Vec<ActuatorCommand>,
    /// Retry policy for the broker connection.
    pub reconnection: RetryBackoff,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            home_name: "My SVT".to_string(),
            broker: BrokerConfig::default(),
            ingest_prefixes: IngestFilter::default().prefixes().to_vec(),
            command_channel: CommandChannelConfig::default(),
            cloud_feed: CloudFeedConfig::default(),
            actuators: default_actuators(),
            reconnection: RetryBackoff::default(),
        }
    }
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// Optional user name; credentials are sent only when set.
    pub username: Option<String>,
    /// Password paired with `username`.
    pub password: Option<String>,
    /// MQTT keep-alive interval.
    pub keep_alive_secs: u64,
    /// How long startup waits for the broker.
    pub connection_timeout_secs: u64,
    /// Fixed client id; empty generates one.
    pub client_id: String,
    /// Subscription filter; `#` receives everything.
    pub subscription: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            username: None,
            password: None,
            keep_alive_secs: 60,
            connection_timeout_secs: 10,
            client_id: "Client_C".to_string(),
            subscription: "#".to_string(),
        }
    }
}

/// Command channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandChannelConfig {
    /// Socket address to listen on.
    pub listen_addr: String,
    /// Wait for the first bytes of a request.
    pub request_timeout_ms: u64,
    /// Quiet gap that ends an unterminated request.
    pub idle_timeout_ms: u64,
    /// Request size cap.
    pub max_request_bytes: usize,
}

impl Default for CommandChannelConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:12350".to_string(),
            request_timeout_ms: 5000,
            idle_timeout_ms: 200,
            max_request_bytes: 1024,
        }
    }
}

/// Cloud feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudFeedConfig {
    /// Whether the feed loop runs at all.
    pub enabled: bool,
    /// Device category whose readings are relayed.
    pub sensor_category: String,
    /// Pause after each room.
    pub room_delay_secs: u64,
    /// Pause after each cycle.
    pub cycle_delay_secs: u64,
    /// Pause before the first cycle.
    pub startup_delay_secs: u64,
    /// Room to channel credentials. Empty values leave a room unmapped.
    pub rooms: HashMap<String, ChannelCredentials>,
}

impl Default for CloudFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sensor_category: DEFAULT_SENSOR_CATEGORY.to_string(),
            room_delay_secs: 20,
            cycle_delay_secs: 900,
            startup_delay_secs: 2,
            rooms: HashMap::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid
    /// JSON, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.host.trim().is_empty() {
            return Err(ConfigError::Invalid("broker.host is empty".to_string()));
        }
        if self.ingest_prefixes.iter().all(|p| p.is_empty()) {
            return Err(ConfigError::Invalid(
                "ingest_prefixes needs at least one non-empty prefix".to_string(),
            ));
        }
        if self.command_channel.max_request_bytes == 0 {
            return Err(ConfigError::Invalid(
                "command_channel.max_request_bytes must be positive".to_string(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Returns the parsed command channel address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the address does not parse.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = &self.command_channel.listen_addr;
        addr.parse()
            .map_err(|e| ConfigError::Invalid(format!("command_channel.listen_addr {addr:?}: {e}")))
    }

    /// Returns the ingest filter.
    #[must_use]
    pub fn ingest_filter(&self) -> IngestFilter {
        IngestFilter::new(self.ingest_prefixes.iter().filter(|p| !p.is_empty()).cloned())
    }

    /// Returns a bus builder for the configured broker.
    #[cfg(feature = "mqtt")]
    #[must_use]
    pub fn bus_builder(&self) -> crate::protocol::MqttBusBuilder {
        let broker = &self.broker;
        let mut builder = crate::protocol::MqttBus::builder()
            .host(&broker.host)
            .port(broker.port)
            .keep_alive(Duration::from_secs(broker.keep_alive_secs))
            .connection_timeout(Duration::from_secs(broker.connection_timeout_secs))
            .subscription(&broker.subscription)
            .ingest_filter(self.ingest_filter())
            .reconnection(self.reconnection);

        if !broker.client_id.is_empty() {
            builder = builder.client_id(&broker.client_id);
        }
        if let Some(username) = &broker.username {
            builder = builder.credentials(username, broker.password.clone().unwrap_or_default());
        }
        builder
    }

    /// Returns the command channel read limits.
    #[must_use]
    pub fn channel_limits(&self) -> ChannelLimits {
        ChannelLimits {
            request_timeout: Duration::from_millis(self.command_channel.request_timeout_ms),
            idle_timeout: Duration::from_millis(self.command_channel.idle_timeout_ms),
            max_request_bytes: self.command_channel.max_request_bytes,
        }
    }

    /// Returns the room to channel mapping.
    #[must_use]
    pub fn cloud_mapping(&self) -> CloudMapping {
        self.cloud_feed
            .rooms
            .iter()
            .map(|(room, creds)| (room.clone(), creds.clone()))
            .collect()
    }

    /// Returns the cloud feed pacing.
    #[must_use]
    pub fn feed_schedule(&self) -> FeedSchedule {
        FeedSchedule {
            startup_delay: Duration::from_secs(self.cloud_feed.startup_delay_secs),
            room_delay: Duration::from_secs(self.cloud_feed.room_delay_secs),
            cycle_delay: Duration::from_secs(self.cloud_feed.cycle_delay_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_stock_installation() {
        let config: CoordinatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoordinatorConfig::default());
        assert_eq!(config.home_name, "My SVT");
        assert_eq!(config.broker.client_id, "Client_C");
        assert_eq!(config.listen_addr().unwrap().port(), 12350);
        assert_eq!(config.actuators.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let json = r#"{
            "broker": { "host": "192.168.178.10" },
            "cloud_feed": {
                "room_delay_secs": 1,
                "rooms": { "room2R": { "channel_id": "1234", "write_key": "ABCD" } }
            }
        }"#;
        let config: CoordinatorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.broker.host, "192.168.178.10");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.cloud_feed.cycle_delay_secs, 900);

        let schedule = config.feed_schedule();
        assert_eq!(schedule.room_delay, Duration::from_secs(1));
        assert_eq!(schedule.startup_delay, Duration::from_secs(2));

        let mapping = config.cloud_mapping();
        assert_eq!(mapping.resolve("room2R").unwrap().publish_topic(), "1234/publish/ABCD");
    }

    #[test]
    fn validate_rejects_bad_listen_addr() {
        let mut config = CoordinatorConfig::default();
        config.command_channel.listen_addr = "not an address".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_empty_host_and_prefixes() {
        let mut config = CoordinatorConfig::default();
        config.broker.host = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = CoordinatorConfig::default();
        config.ingest_prefixes = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn reconnection_section_is_the_backoff() {
        let json = r#"{"reconnection": {"initial_delay_ms": 250, "max_retries": 3}}"#;
        let config: CoordinatorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.reconnection.max_retries, Some(3));
        assert_eq!(config.reconnection.max_delay_ms, 60_000);
        assert_eq!(config.reconnection.delay(1), Duration::from_millis(500));
    }

    #[test]
    fn channel_limits_from_config() {
        let limits = CoordinatorConfig::default().channel_limits();
        assert_eq!(limits, ChannelLimits::default());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = CoordinatorConfig::load("/nonexistent/autohome.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reports_parse_error() {
        let path = std::env::temp_dir().join(format!("autohome-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();

        let err = CoordinatorConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_valid_file() {
        let path =
            std::env::temp_dir().join(format!("autohome-config-ok-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"home_name": "Cabin"}"#).unwrap();

        let config = CoordinatorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.home_name, "Cabin");
    }
}
