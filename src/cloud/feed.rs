// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic republishing of room sensor readings to the cloud channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::protocol::Publisher;
use crate::store::TopicStore;
use crate::topic::TopicEntry;

use super::{CloudMapping, SensorAttribute};

/// Sensor category relayed when nothing else is configured.
pub const DEFAULT_SENSOR_CATEGORY: &str = "DHT22";

/// Pacing of the feed loop.
///
/// The cloud service rate-limits writes per channel, so rooms are spaced by
/// `room_delay` and whole cycles by `cycle_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSchedule {
    /// Wait before the first cycle.
    pub startup_delay: Duration,
    /// Wait after each room.
    pub room_delay: Duration,
    /// Wait after each full cycle.
    pub cycle_delay: Duration,
}

impl Default for FeedSchedule {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(2),
            room_delay: Duration::from_secs(20),
            cycle_delay: Duration::from_secs(900),
        }
    }
}

/// One translated outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    /// Outbound topic, `<channel>/publish/<key>`.
    pub topic: String,
    /// Query-string payload, e.g. `field1=21.5&field2=60.0`.
    pub payload: String,
}

/// Translates store contents into cloud-channel updates and publishes them.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use autohome::cloud::{ChannelCredentials, CloudFeed, CloudMapping};
/// use autohome::protocol::RecordingPublisher;
/// use autohome::store::TopicStore;
///
/// let store = Arc::new(TopicStore::new("My SVT"));
/// store.ingest("/room2R/DHT22/temperature", "21.5");
///
/// let mapping = CloudMapping::new().with_room("room2R", ChannelCredentials::new("1234", "ABCD"));
/// let feed = CloudFeed::new(store, RecordingPublisher::new(), mapping);
///
/// let update = feed.translate("room2R").unwrap();
/// assert_eq!(update.topic, "1234/publish/ABCD");
/// assert_eq!(update.payload, "field1=21.5");
/// ```
#[derive(Debug)]
pub struct CloudFeed<P> {
    store: Arc<TopicStore>,
    publisher: P,
    mapping: CloudMapping,
    schedule: FeedSchedule,
    sensor_category: String,
}

impl<P: Publisher> CloudFeed<P> {
    /// Creates a feed with the default schedule and sensor category.
    #[must_use]
    pub fn new(store: Arc<TopicStore>, publisher: P, mapping: CloudMapping) -> Self {
        Self {
            store,
            publisher,
            mapping,
            schedule: FeedSchedule::default(),
            sensor_category: DEFAULT_SENSOR_CATEGORY.to_string(),
        }
    }

    /// Sets the loop pacing.
    #[must_use]
    pub fn with_schedule(mut self, schedule: FeedSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the device category whose attributes are relayed.
    #[must_use]
    pub fn with_sensor_category(mut self, category: impl Into<String>) -> Self {
        self.sensor_category = category.into();
        self
    }

    /// Returns the loop pacing.
    #[must_use]
    pub fn schedule(&self) -> FeedSchedule {
        self.schedule
    }

    /// Builds the update for `room` from the current store contents.
    ///
    /// Returns `None` if the room is not mapped to configured credentials
    /// or has no recognised attributes.
    #[must_use]
    pub fn translate(&self, room: &str) -> Option<FeedUpdate> {
        let Some(credentials) = self.mapping.resolve(room) else {
            tracing::debug!(room = %room, "Room has no cloud channel, skipping");
            return None;
        };

        let snapshot = self.store.snapshot();
        let fields = self.collect_fields(room, &snapshot);
        if fields.is_empty() {
            tracing::debug!(room = %room, "No relayable attributes for room");
            return None;
        }

        let payload = fields
            .iter()
            .map(|(attr, value)| format!("{}={}", attr.field_name(), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Some(FeedUpdate {
            topic: credentials.publish_topic(),
            payload,
        })
    }

    fn collect_fields<'e>(
        &self,
        room: &str,
        entries: &'e [TopicEntry],
    ) -> BTreeMap<SensorAttribute, &'e str> {
        entries
            .iter()
            .filter_map(|entry| {
                let path = entry.path().ok()?;
                let attribute = path
                    .attribute_of(room, &self.sensor_category)?
                    .parse::<SensorAttribute>()
                    .ok()?;
                Some((attribute, entry.value()))
            })
            .collect()
    }

    /// Translates and publishes the update for `room`.
    ///
    /// Returns `true` if a message was handed to the bus. Publish failures
    /// are logged and reported as `false`.
    pub async fn publish_room(&self, room: &str) -> bool {
        let Some(update) = self.translate(room) else {
            return false;
        };

        match self.publisher.publish(&update.topic, &update.payload).await {
            Ok(()) => {
                tracing::info!(
                    room = %room,
                    topic = %update.topic,
                    payload = %update.payload,
                    "Cloud feed update published"
                );
                true
            }
            Err(e) => {
                tracing::warn!(room = %room, topic = %update.topic, error = %e, "Cloud feed publish failed");
                false
            }
        }
    }

    /// Runs one pass over every known room, sleeping `room_delay` after each.
    ///
    /// Returns the number of updates published.
    pub async fn run_cycle(&self) -> usize {
        let rooms = self.store.rooms();
        tracing::debug!(rooms = rooms.len(), "Cloud feed cycle started");

        let mut published = 0;
        for room in &rooms {
            if self.publish_room(room).await {
                published += 1;
            }
            tokio::time::sleep(self.schedule.room_delay).await;
        }
        published
    }

    /// Runs cycles forever, sleeping `cycle_delay` between them.
    pub async fn run(&self) {
        tracing::info!(
            room_delay_secs = self.schedule.room_delay.as_secs(),
            cycle_delay_secs = self.schedule.cycle_delay.as_secs(),
            category = %self.sensor_category,
            "Cloud feed started"
        );
        tokio::time::sleep(self.schedule.startup_delay).await;

        loop {
            let published = self.run_cycle().await;
            tracing::debug!(published, "Cloud feed cycle finished");
            tokio::time::sleep(self.schedule.cycle_delay).await;
        }
    }
}
