// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Current value and bookkeeping for one topic.

use chrono::{DateTime, Local, Utc};

use crate::error::TopicError;

use super::TopicPath;

/// Format used for every timestamp shown to a command client.
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One named attribute of one device, with its latest value.
///
/// The value is kept as the raw payload text; nothing is parsed at ingestion
/// time. Entries are only created and updated by
/// [`TopicStore`](crate::store::TopicStore), which guarantees that
/// `last_updated_at() >= created_at()` and that `update_count()` counts every
/// write including the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    name: String,
    value: String,
    created_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
    update_count: u64,
}

impl TopicEntry {
    /// Creates an entry for a topic observed for the first time.
    pub(crate) fn new(name: String, value: String, at: DateTime<Utc>) -> Self {
        Self {
            name,
            value,
            created_at: at,
            last_updated_at: at,
            update_count: 1,
        }
    }

    /// Overwrites the value.
    ///
    /// A clock that steps backwards never moves `last_updated_at` before an
    /// earlier write.
    pub(crate) fn update(&mut self, value: String, at: DateTime<Utc>) {
        self.value = value;
        self.last_updated_at = at.max(self.last_updated_at);
        self.update_count += 1;
    }

    /// Returns the topic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the latest raw value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns when the topic was first seen.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the value was last written.
    #[must_use]
    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }

    /// Returns how many times the value has been written.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Parses the topic name.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError`] if the name has no usable room segment.
    pub fn path(&self) -> Result<TopicPath<'_>, TopicError> {
        TopicPath::parse(&self.name)
    }

    /// Renders `name, value, last update` on one line.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "{}, {}, {}",
            self.name,
            self.value,
            format_timestamp(self.last_updated_at)
        )
    }

    /// Renders every field, one per line.
    #[must_use]
    pub fn detail(&self) -> String {
        format!(
            "{}\n  value: {}\n  created: {}\n  last update: {}\n  updates: {}\n",
            self.name,
            self.value,
            format_timestamp(self.created_at),
            format_timestamp(self.last_updated_at),
            self.update_count
        )
    }
}

/// Formats a timestamp in local time.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}
