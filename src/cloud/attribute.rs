// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor attributes relayed to the cloud feed.

use std::fmt;
use std::str::FromStr;

use crate::error::TopicError;

/// An environment-sensor attribute with a fixed cloud field slot.
///
/// # Examples
///
/// ```
/// use autohome::cloud::SensorAttribute;
///
/// let attr: SensorAttribute = "humidity".parse().unwrap();
/// assert_eq!(attr, SensorAttribute::Humidity);
/// assert_eq!(attr.field_number(), 2);
/// assert_eq!(attr.field_name(), "field2");
///
/// assert!("pressure".parse::<SensorAttribute>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorAttribute {
    /// Air temperature.
    Temperature,
    /// Relative humidity.
    Humidity,
    /// Node battery level.
    Battery,
    /// Node radio signal strength.
    Rssi,
}

impl SensorAttribute {
    /// All attributes in field order.
    pub const ALL: [Self; 4] = [Self::Temperature, Self::Humidity, Self::Battery, Self::Rssi];

    /// Returns the attribute segment used in topic names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Battery => "battery",
            Self::Rssi => "rssi",
        }
    }

    /// Returns the cloud field slot (1-4).
    #[must_use]
    pub const fn field_number(&self) -> u8 {
        match self {
            Self::Temperature => 1,
            Self::Humidity => 2,
            Self::Battery => 3,
            Self::Rssi => 4,
        }
    }

    /// Returns the query-string key, e.g. `field1`.
    #[must_use]
    pub fn field_name(&self) -> String {
        format!("field{}", self.field_number())
    }
}

impl fmt::Display for SensorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorAttribute {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Self::Temperature),
            "humidity" => Ok(Self::Humidity),
            "battery" => Ok(Self::Battery),
            "rssi" => Ok(Self::Rssi),
            _ => Err(TopicError::UnknownAttribute(s.to_string())),
        }
    }
}
