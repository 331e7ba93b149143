// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloud telemetry feed.
//!
//! Every cycle the feed walks the rooms known to the store. For each room
//! mapped to a cloud channel it gathers the environment-sensor readings,
//! encodes them as a ThingSpeak-style query string and publishes them back
//! onto the bus, where a relay forwards them to the service:
//!
//! ```text
//! /room2R/DHT22/temperature = 21.5   ┐
//! /room2R/DHT22/humidity    = 60.0   ┘ → 1234/publish/ABCD : field1=21.5&field2=60.0
//! ```

mod attribute;
mod feed;
mod mapping;

pub use attribute::SensorAttribute;
pub use feed::{CloudFeed, DEFAULT_SENSOR_CATEGORY, FeedSchedule, FeedUpdate};
pub use mapping::{ChannelCredentials, CloudMapping};
