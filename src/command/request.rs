// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of command-channel requests.

use super::ActuatorCommand;

/// A parsed command-channel request.
///
/// Built-in commands take precedence over actuator commands with the same
/// text.
///
/// # Examples
///
/// ```
/// use autohome::command::{Request, default_actuators};
///
/// let actuators = default_actuators();
/// assert_eq!(Request::parse("/status\r\n", &actuators), Request::Status);
/// assert_eq!(
///     Request::parse("/view /room1L/lights", &actuators),
///     Request::View("/room1L/lights")
/// );
/// assert!(matches!(Request::parse("/lights=on", &actuators), Request::Actuator(_)));
/// assert_eq!(Request::parse("/reboot", &actuators), Request::Unrecognized("/reboot"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// `/help`: usage text.
    Help,
    /// `/list`: every topic name.
    List,
    /// `/status`: every topic with value and last update.
    Status,
    /// `/rooms`: derived room set.
    Rooms,
    /// `/view <topic>`: one topic in detail.
    View(&'a str),
    /// A configured actuator command.
    Actuator(&'a ActuatorCommand),
    /// Anything else, trimmed.
    Unrecognized(&'a str),
}

impl<'a> Request<'a> {
    /// Parses raw request text against the actuator table.
    ///
    /// Surrounding whitespace, including a trailing line terminator, is
    /// ignored. Matching is otherwise exact.
    #[must_use]
    pub fn parse(input: &'a str, actuators: &'a [ActuatorCommand]) -> Self {
        let input = input.trim();
        match input {
            "/help" => return Self::Help,
            "/list" => return Self::List,
            "/status" => return Self::Status,
            "/rooms" => return Self::Rooms,
            _ => {}
        }

        if let Some(rest) = input.strip_prefix("/view")
            && rest.starts_with(char::is_whitespace)
        {
            let topic = rest.trim();
            if !topic.is_empty() {
                return Self::View(topic);
            }
        }

        actuators
            .iter()
            .find(|a| a.matches(input))
            .map_or(Self::Unrecognized(input), Self::Actuator)
    }
}
