// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::topic::TopicEntry;

use super::render;

/// Insertion-ordered map from topic name to [`TopicEntry`].
///
/// Every operation takes the lock for the shortest possible time: reads
/// copy what they need and release it before any formatting or I/O, so a
/// slow reader never stalls ingestion. Entries are never removed.
#[derive(Debug)]
pub struct TopicStore {
    /// Display name shown in the status header.
    name: String,
    /// When the store was constructed.
    created_at: DateTime<Utc>,
    inner: RwLock<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    /// Entries in first-seen order.
    ordered: Vec<TopicEntry>,
    /// Position of each topic name in `ordered`.
    index: HashMap<String, usize>,
}

impl TopicStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            inner: RwLock::new(Entries::default()),
        }
    }

    /// Returns the store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns when the store was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Records a value for a topic, stamped with the current time.
    ///
    /// Returns `true` if the topic was seen for the first time.
    pub fn ingest(&self, topic: &str, value: impl Into<String>) -> bool {
        self.ingest_at(topic, value, Utc::now())
    }

    /// Records a value for a topic with an explicit timestamp.
    ///
    /// A new topic gets an entry with `update_count == 1`; a known topic has
    /// its value overwritten and its counter incremented. The whole write
    /// happens under one lock acquisition, so no reader can observe a value
    /// paired with a stale timestamp.
    ///
    /// Returns `true` if the topic was seen for the first time.
    pub fn ingest_at(&self, topic: &str, value: impl Into<String>, at: DateTime<Utc>) -> bool {
        let value = value.into();
        let mut inner = self.inner.write();

        if let Some(&pos) = inner.index.get(topic) {
            inner.ordered[pos].update(value, at);
            return false;
        }

        let pos = inner.ordered.len();
        inner
            .ordered
            .push(TopicEntry::new(topic.to_string(), value, at));
        inner.index.insert(topic.to_string(), pos);
        true
    }

    /// Returns a copy of the entry for `topic`, if it has been seen.
    #[must_use]
    pub fn lookup(&self, topic: &str) -> Option<TopicEntry> {
        let inner = self.inner.read();
        inner
            .index
            .get(topic)
            .map(|&pos| inner.ordered[pos].clone())
    }

    /// Returns a point-in-time copy of every entry, in first-seen order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TopicEntry> {
        self.inner.read().ordered.clone()
    }

    /// Returns the number of known topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().ordered.len()
    }

    /// Returns `true` if no topic has been ingested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the distinct rooms found in topic names, in first-seen order.
    ///
    /// Names without a usable room segment are skipped.
    #[must_use]
    pub fn rooms(&self) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut seen = HashSet::new();
        let mut rooms = Vec::new();

        for entry in &snapshot {
            match entry.path() {
                Ok(path) => {
                    if seen.insert(path.room()) {
                        rooms.push(path.room().to_string());
                    }
                }
                Err(e) => {
                    tracing::debug!(topic = %entry.name(), reason = %e, "Skipping topic without room");
                }
            }
        }

        rooms
    }

    /// Renders one topic name per line.
    #[must_use]
    pub fn render_listing(&self) -> String {
        render::listing(&self.snapshot())
    }

    /// Renders the store header followed by one status line per topic.
    #[must_use]
    pub fn render_status(&self) -> String {
        render::status(&self.name, self.created_at, &self.snapshot())
    }
}
