// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room to cloud-channel mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity and write key of one cloud channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCredentials {
    /// External channel identifier.
    pub channel_id: String,
    /// Write API key for the channel.
    pub write_key: String,
}

impl ChannelCredentials {
    /// Creates credentials for a channel.
    #[must_use]
    pub fn new(channel_id: impl Into<String>, write_key: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            write_key: write_key.into(),
        }
    }

    /// Returns `true` if both the channel id and the write key are filled in.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.channel_id.is_empty() && !self.write_key.is_empty()
    }

    /// Returns the outbound bus topic for this channel.
    #[must_use]
    pub fn publish_topic(&self) -> String {
        format!("{}/publish/{}", self.channel_id, self.write_key)
    }
}

/// Static table of which room feeds which cloud channel.
///
/// # Examples
///
/// ```
/// use autohome::cloud::{ChannelCredentials, CloudMapping};
///
/// let mapping = CloudMapping::new()
///     .with_room("room2R", ChannelCredentials::new("1234", "ABCD"))
///     .with_room("room3L", ChannelCredentials::new("", ""));
///
/// assert!(mapping.resolve("room2R").is_some());
/// assert!(mapping.resolve("room3L").is_none());
/// assert!(mapping.resolve("garden").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudMapping {
    rooms: HashMap<String, ChannelCredentials>,
}

impl CloudMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the credentials for `room`.
    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>, credentials: ChannelCredentials) -> Self {
        self.insert(room, credentials);
        self
    }

    /// Adds or replaces the credentials for `room`.
    pub fn insert(&mut self, room: impl Into<String>, credentials: ChannelCredentials) {
        self.rooms.insert(room.into(), credentials);
    }

    /// Returns the credentials for `room` if it is mapped and configured.
    #[must_use]
    pub fn resolve(&self, room: &str) -> Option<&ChannelCredentials> {
        self.rooms.get(room).filter(|c| c.is_configured())
    }

    /// Returns the number of mapped rooms, configured or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if no room is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl FromIterator<(String, ChannelCredentials)> for CloudMapping {
    fn from_iter<T: IntoIterator<Item = (String, ChannelCredentials)>>(iter: T) -> Self {
        Self {
            rooms: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_topic_format() {
        let creds = ChannelCredentials::new("1234", "ABCD");
        assert_eq!(creds.publish_topic(), "1234/publish/ABCD");
    }

    #[test]
    fn partially_filled_credentials_are_unconfigured() {
        assert!(!ChannelCredentials::new("1234", "").is_configured());
        assert!(!ChannelCredentials::new("", "ABCD").is_configured());
        assert!(ChannelCredentials::new("1234", "ABCD").is_configured());
    }

    #[test]
    fn resolve_skips_absent_and_unconfigured() {
        let mapping: CloudMapping = [
            ("room1L".to_string(), ChannelCredentials::default()),
            ("room2R".to_string(), ChannelCredentials::new("1234", "ABCD")),
        ]
        .into_iter()
        .collect();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.resolve("room2R").unwrap().channel_id, "1234");
        assert!(mapping.resolve("room1L").is_none());
        assert!(mapping.resolve("room0R").is_none());
    }

    #[test]
    fn insert_replaces() {
        let mut mapping = CloudMapping::new();
        mapping.insert("room2R", ChannelCredentials::new("1", "A"));
        mapping.insert("room2R", ChannelCredentials::new("2", "B"));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.resolve("room2R").unwrap().write_key, "B");
    }
}
