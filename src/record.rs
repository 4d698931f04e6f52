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

//! Log records and the entries they are built from.

use std::fmt;

use jiff::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::AppError;
use crate::Error;
use crate::ErrorKind;

/// The level of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational record.
    Info,
    /// Error record, optionally carrying a cause.
    Error,
}

impl Level {
    /// Return the lowercase name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call-site part of a log record.
///
/// A plain message is recorded as `{"message": <message>}`; fields are merged into the record
/// as they are.
///
/// # Examples
///
/// ```
/// use logweave::Entry;
/// use serde_json::json;
///
/// let entry = Entry::from("Sending expression.");
/// assert_eq!(entry.into_fields(), json!({"message": "Sending expression."}).as_object().unwrap().clone());
///
/// let entry = Entry::from(json!({"message": "Sending expression.", "expression": "1 + 2"}));
/// assert!(matches!(entry, Entry::Fields(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A message string.
    Message(String),
    /// A mapping of fields.
    Fields(Map<String, Value>),
}

impl Entry {
    /// Convert this entry to the fields it contributes to a record.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Entry::Message(message) => {
                let mut fields = Map::new();
                fields.insert("message".to_string(), Value::String(message));
                fields
            }
            Entry::Fields(fields) => fields,
        }
    }
}

impl From<&str> for Entry {
    fn from(message: &str) -> Self {
        Entry::Message(message.to_string())
    }
}

impl From<String> for Entry {
    fn from(message: String) -> Self {
        Entry::Message(message)
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Entry::Fields(fields)
    }
}

/// Objects become [`Entry::Fields`], strings [`Entry::Message`]; any other value is recorded as
/// the message.
impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Entry::Fields(fields),
            Value::String(message) => Entry::Message(message),
            other => {
                let mut fields = Map::new();
                fields.insert("message".to_string(), other);
                Entry::Fields(fields)
            }
        }
    }
}

/// An assembled log record: an ordered mapping of field names to values.
///
/// Fields are laid out as `_level`, `_timestamp`, the logger's default settings and the entry
/// fields. A later field replaces the value of an earlier one with the same name and keeps its
/// position. When a cause is given, `rootCause` is always the last field.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    /// Assemble a record.
    pub fn new(
        level: Level,
        time: Timestamp,
        default_settings: &Map<String, Value>,
        entry: Entry,
        cause: Option<&AppError>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("_level".to_string(), Value::from(level.as_str()));
        fields.insert("_timestamp".to_string(), Value::from(format_timestamp(time)));

        for (key, value) in default_settings {
            fields.insert(key.clone(), value.clone());
        }
        for (key, value) in entry.into_fields() {
            fields.insert(key, value);
        }

        if let Some(cause) = cause {
            fields.shift_remove("rootCause");
            fields.insert("rootCause".to_string(), Value::Object(cause.unroll()));
        }

        Self { fields }
    }

    /// Return the value of the field `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Return all fields of this record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Serialize the record as a single line of JSON, without the trailing newline.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(&self.fields).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to serialize log record").with_source(err)
        })
    }
}

/// Render `time` as an HTTP date in UTC, e.g. `Wed, 14 Oct 2026 09:15:00 GMT`.
pub(crate) fn format_timestamp(time: Timestamp) -> String {
    time.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
