// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// The time granularity at which a new log file is opened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    /// A new file every minute.
    Minute,
    /// A new file every hour.
    Hour,
    /// A new file every day.
    #[default]
    Day,
}

impl RotationStrategy {
    /// Return the lowercase name of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStrategy::Minute => "minute",
            RotationStrategy::Hour => "hour",
            RotationStrategy::Day => "day",
        }
    }

    fn date_format(&self) -> &'static str {
        match self {
            RotationStrategy::Minute => "%Y_%m_%d_%H_%M",
            RotationStrategy::Hour => "%Y_%m_%d_%H",
            RotationStrategy::Day => "%Y_%m_%d",
        }
    }

    /// Render the date stamp of a log file name for `now`, in UTC.
    pub(crate) fn date_stamp(&self, now: Timestamp) -> String {
        now.strftime(self.date_format()).to_string()
    }
}

impl fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(RotationStrategy::Minute),
            "hour" => Ok(RotationStrategy::Hour),
            "day" => Ok(RotationStrategy::Day),
            _ => Err(Error::illegal_argument("Unknown rotation strategy.")
                .with_detail("The rotation strategy must be one of [minute, hour, day].")
                .with_context("rotation", s)),
        }
    }
}
