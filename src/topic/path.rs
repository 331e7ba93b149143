// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured view of a hierarchical topic name.

use std::fmt;

use crate::error::TopicError;

/// A topic name split into room, device category and attribute.
///
/// Topic names look like `/<room>/<category>/<attribute>`. Only the room is
/// mandatory; actuator topics such as `/room1L/lights` carry a category and
/// no attribute. Everything after the category is kept together as the
/// attribute, so deeper names still parse.
///
/// # Examples
///
/// ```
/// use autohome::topic::TopicPath;
///
/// let path = TopicPath::parse("/room2R/DHT22/temperature").unwrap();
/// assert_eq!(path.room(), "room2R");
/// assert_eq!(path.category(), Some("DHT22"));
/// assert_eq!(path.attribute(), Some("temperature"));
///
/// assert!(TopicPath::parse("room2R/DHT22").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicPath<'a> {
    room: &'a str,
    category: Option<&'a str>,
    attribute: Option<&'a str>,
}

impl<'a> TopicPath<'a> {
    /// Parses a topic name.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError`] if the name has no leading slash or the room
    /// segment is empty.
    pub fn parse(name: &'a str) -> Result<Self, TopicError> {
        let rest = name
            .strip_prefix('/')
            .ok_or_else(|| TopicError::MissingLeadingSlash(name.to_string()))?;

        let mut parts = rest.splitn(3, '/');
        let room = parts.next().unwrap_or_default();
        if room.is_empty() {
            return Err(TopicError::EmptyRoom(name.to_string()));
        }

        Ok(Self {
            room,
            category: parts.next().filter(|s| !s.is_empty()),
            attribute: parts.next().filter(|s| !s.is_empty()),
        })
    }

    /// Returns the room identifier (first segment).
    #[must_use]
    pub fn room(&self) -> &'a str {
        self.room
    }

    /// Returns the device category (second segment), if present.
    #[must_use]
    pub fn category(&self) -> Option<&'a str> {
        self.category
    }

    /// Returns the attribute (everything after the category), if present.
    #[must_use]
    pub fn attribute(&self) -> Option<&'a str> {
        self.attribute
    }

    /// Returns the attribute if this topic belongs to `room` and `category`.
    #[must_use]
    pub fn attribute_of(&self, room: &str, category: &str) -> Option<&'a str> {
        if self.room == room && self.category == Some(category) {
            self.attribute
        } else {
            None
        }
    }
}

impl fmt::Display for TopicPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.room)?;
        if let Some(category) = self.category {
            write!(f, "/{category}")?;
        }
        if let Some(attribute) = self.attribute {
            write!(f, "/{attribute}")?;
        }
        Ok(())
    }
}
