// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive command channel.
//!
//! A client opens a TCP connection, sends one short text request and reads
//! the response until the server closes the connection. The request does
//! not need a line terminator.
//!
//! # Available Commands
//!
//! | Request | Response |
//! |---------|----------|
//! | `/help` | usage text, including the actuator commands |
//! | `/list` | one topic name per line |
//! | `/status` | store header, then `name, value, last update` per topic |
//! | `/rooms` | one room per line |
//! | `/view <topic>` | value, timestamps and update count of one topic |
//! | actuator command | empty; the configured publishes are sent |
//! | anything else | `unrecognized command: ...`; nothing is sent |

mod actuator;
mod channel;
mod request;

pub use actuator::{ActuatorCommand, ActuatorPublish, default_actuators};
pub use channel::{ChannelLimits, CommandChannel};
pub use request::Request;
