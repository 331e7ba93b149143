// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection of inbound bus messages worth storing.
//!
//! The coordinator subscribes to every topic on the broker, including its
//! own outbound actuator and cloud-relay traffic. Only topics published by
//! room, garden and entrance nodes are state; everything else is dropped
//! here.
//!
//! ```text
//! Bus message: /room2R/DHT22/temperature → 21.5
//!                     ↓
//!             IngestFilter.route()
//!                     ↓
//!      prefix "/room" matches → TopicStore.ingest()
//! ```

use crate::store::TopicStore;

/// Prefixes ingested when nothing else is configured.
pub const DEFAULT_INGEST_PREFIXES: [&str; 3] = ["/room", "/garden", "/entrance"];

/// Routes inbound messages into the store by topic prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFilter {
    prefixes: Vec<String>,
}

impl IngestFilter {
    /// Creates a filter accepting topics that start with any of `prefixes`.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns `true` if `topic` should be stored.
    #[must_use]
    pub fn accepts(&self, topic: &str) -> bool {
        self.prefixes.iter().any(|p| topic.starts_with(p.as_str()))
    }

    /// Ingests the message if its topic is accepted.
    ///
    /// Returns `true` if the message reached the store.
    pub fn route(&self, store: &TopicStore, topic: &str, payload: &str) -> bool {
        if !self.accepts(topic) {
            tracing::trace!(topic = %topic, "Ignoring topic outside ingest prefixes");
            return false;
        }

        if store.ingest(topic, payload) {
            tracing::info!(topic = %topic, value = %payload, "New topic registered");
        } else {
            tracing::debug!(topic = %topic, value = %payload, "Topic updated");
        }
        true
    }
}

impl Default for IngestFilter {
    fn default() -> Self {
        Self::new(DEFAULT_INGEST_PREFIXES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_home_prefixes() {
        let filter = IngestFilter::default();
        assert!(filter.accepts("/room2R/DHT22/temperature"));
        assert!(filter.accepts("/garden/soil/moisture"));
        assert!(filter.accepts("/entrance/door/open"));
    }

    #[test]
    fn default_rejects_other_traffic() {
        let filter = IngestFilter::default();
        assert!(!filter.accepts("/set/room3L/Yeelight/power"));
        assert!(!filter.accepts("1234/publish/ABCD"));
        assert!(!filter.accepts("/tg_msg/message"));
        assert!(!filter.accepts("room2R/DHT22/temperature"));
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let filter = IngestFilter::default();
        assert!(!filter.accepts("/Room0R/DHT22/temperature"));
    }

    #[test]
    fn route_ingests_accepted_topics_only() {
        let store = TopicStore::new("home");
        let filter = IngestFilter::default();

        assert!(filter.route(&store, "/room1L/lights", "1"));
        assert!(!filter.route(&store, "/set/room3L/Yeelight/power", "on"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("/room1L/lights").unwrap().value(), "1");
    }

    #[test]
    fn custom_prefixes() {
        let filter = IngestFilter::new(["/cellar"]);
        assert_eq!(filter.prefixes(), ["/cellar"]);
        assert!(filter.accepts("/cellar/DHT22/humidity"));
        assert!(!filter.accepts("/room1L/lights"));
    }
}
