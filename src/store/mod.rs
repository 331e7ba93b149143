// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The shared topic state store.
//!
//! [`TopicStore`] holds the latest value of every topic seen on the bus. The
//! bus ingestion task is its only writer; the command channel and the cloud
//! feed read it concurrently through an `Arc<TopicStore>`.
//!
//! # Examples
//!
//! ```
//! use autohome::store::TopicStore;
//!
//! let store = TopicStore::new("My SVT");
//! store.ingest("/room2R/DHT22/temperature", "21.5");
//! store.ingest("/room3L/Yeelight/power", "on");
//!
//! assert_eq!(store.rooms(), vec!["room2R".to_string(), "room3L".to_string()]);
//! assert_eq!(store.lookup("/room3L/Yeelight/power").unwrap().value(), "on");
//! ```

mod render;
mod topic_store;

pub use topic_store::TopicStore;
