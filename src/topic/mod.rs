// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic names and the per-topic state kept by the store.
//!
//! Sensor and actuator nodes publish on names such as
//! `/room2R/DHT22/temperature`. The first segment is the room; it is always
//! derived with [`TopicPath::parse`] and never stored on its own.

mod entry;
mod path;

pub use entry::TopicEntry;
pub use path::TopicPath;

pub(crate) use entry::format_timestamp;
