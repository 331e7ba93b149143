// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text rendering of store snapshots.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::topic::{TopicEntry, format_timestamp};

/// One topic name per line.
pub(super) fn listing(entries: &[TopicEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(entry.name());
        out.push('\n');
    }
    out
}

/// Header line followed by `name, value, last update` per topic.
pub(super) fn status(name: &str, created_at: DateTime<Utc>, entries: &[TopicEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{name} created on {}", format_timestamp(created_at));
    for entry in entries {
        let _ = writeln!(out, "{}", entry.status_line());
    }
    out
}
