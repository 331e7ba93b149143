// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the coordinator.
//!
//! Failures are grouped by where they come from: the bus and the command
//! transport, topic-name parsing, and configuration loading. None of the
//! store operations can fail, so there is no store error.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the bus or a command client.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A topic name could not be parsed.
    #[error("topic error: {0}")]
    Topic(#[from] TopicError),

    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to bus and transport communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker or peer failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Reasons a topic name has no usable room segment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// The name does not start with `/`.
    #[error("topic {0:?} does not start with '/'")]
    MissingLeadingSlash(String),

    /// The first segment after the leading slash is empty.
    #[error("topic {0:?} has an empty room segment")]
    EmptyRoom(String),

    /// The attribute segment is not a known sensor attribute.
    #[error("unknown sensor attribute {0:?}")]
    UnknownAttribute(String),
}

/// Errors raised while loading the coordinator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected schema.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying JSON failure.
        source: serde_json::Error,
    },

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
