// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `autohome` - home-automation coordinator on top of an MQTT bus.
//!
//! Room, garden and entrance nodes publish their readings and actuator
//! states on topics like `/room2R/DHT22/temperature`. The coordinator keeps
//! the latest value of every such topic in a [`TopicStore`] and serves two
//! bridges from it:
//!
//! - **Command channel**: a TCP text interface answering `/list`,
//!   `/status`, `/rooms`, `/view <topic>` and `/help`, and turning actuator
//!   commands such as `/lights=on` into bus publishes.
//! - **Cloud feed**: a periodic loop republishing each room's environment
//!   readings in ThingSpeak's `field1=..&field2=..` format, paced to the
//!   service's rate limits.
//!
//! # Quick Start
//!
//! ```no_run
//! use autohome::{Coordinator, CoordinatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> autohome::Result<()> {
//!     let config = CoordinatorConfig::load("autohome.json")?;
//!     Coordinator::new(config).run().await
//! }
//! ```
//!
//! # Using the pieces directly
//!
//! The store and both bridges work without a broker. Anything implementing
//! [`Publisher`] can take the outbound side:
//!
//! ```
//! use std::sync::Arc;
//! use autohome::{CommandChannel, RecordingPublisher, TopicStore};
//!
//! # async fn example() {
//! let store = Arc::new(TopicStore::new("My SVT"));
//! store.ingest("/room2R/DHT22/temperature", "21.5");
//!
//! let publisher = RecordingPublisher::new();
//! let channel = CommandChannel::new(Arc::clone(&store), publisher.clone());
//!
//! channel.handle_request("/lights=off").await;
//! assert_eq!(publisher.published().len(), 3);
//! # }
//! ```
//!
//! # Features
//!
//! - `mqtt` (default): the `rumqttc` broker connection, [`Coordinator`] and
//!   the `autohome-master` binary.

pub mod cloud;
pub mod command;
pub mod config;
#[cfg(feature = "mqtt")]
mod coordinator;
pub mod error;
pub mod protocol;
pub mod store;
pub mod topic;

pub use cloud::{ChannelCredentials, CloudFeed, CloudMapping, FeedSchedule, SensorAttribute};
pub use command::{ActuatorCommand, ActuatorPublish, ChannelLimits, CommandChannel};
pub use config::CoordinatorConfig;
#[cfg(feature = "mqtt")]
pub use coordinator::Coordinator;
pub use error::{ConfigError, Error, ProtocolError, Result, TopicError};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBus, MqttBusBuilder};
pub use protocol::{DryRunPublisher, IngestFilter, Publisher, RecordingPublisher, RetryBackoff};
pub use store::TopicStore;
pub use topic::{TopicEntry, TopicPath};
