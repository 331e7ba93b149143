// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Direct actuator commands.
//!
//! An actuator command is an exact request string bound to a fixed list of
//! bus publishes. The table is configuration; [`default_actuators`] holds
//! the stock set for the house.

use serde::{Deserialize, Serialize};

/// One outbound publish triggered by an actuator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorPublish {
    /// Bus topic to publish on.
    pub topic: String,
    /// Fixed payload.
    pub payload: String,
}

impl ActuatorPublish {
    /// Creates a publish target.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A request string and the publishes it triggers.
///
/// # Examples
///
/// ```
/// use autohome::command::{ActuatorCommand, ActuatorPublish};
///
/// let cmd = ActuatorCommand::new("/fan=on", [ActuatorPublish::new("/room2R/fan", "1")]);
/// assert!(cmd.matches("/fan=on"));
/// assert!(!cmd.matches("/fan=ON"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Exact request text.
    pub command: String,
    /// Publishes performed, in order.
    pub publishes: Vec<ActuatorPublish>,
}

impl ActuatorCommand {
    /// Creates an actuator command.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        publishes: impl IntoIterator<Item = ActuatorPublish>,
    ) -> Self {
        Self {
            command: command.into(),
            publishes: publishes.into_iter().collect(),
        }
    }

    /// Returns `true` if `request` is exactly this command.
    #[must_use]
    pub fn matches(&self, request: &str) -> bool {
        self.command == request
    }
}

/// Room light topics switched together by `/lights=on|off`.
const LIGHT_TOPICS: [&str; 3] = ["/room1L/lights", "/room2R/lights", "/room3L/lights"];

/// Returns the stock actuator commands.
#[must_use]
pub fn default_actuators() -> Vec<ActuatorCommand> {
    let lamp = "/set/room3L/Yeelight/power";
    let lights = |payload: &str| {
        LIGHT_TOPICS
            .iter()
            .map(|topic| ActuatorPublish::new(*topic, payload))
            .collect::<Vec<_>>()
    };

    vec![
        ActuatorCommand::new(format!("{lamp} on"), [ActuatorPublish::new(lamp, "on")]),
        ActuatorCommand::new(format!("{lamp} off"), [ActuatorPublish::new(lamp, "off")]),
        ActuatorCommand::new("/lights=on", lights("1")),
        ActuatorCommand::new("/lights=off", lights("0")),
    ]
}
