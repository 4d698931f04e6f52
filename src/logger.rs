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

use jiff::Timestamp;
use serde_json::Map;
use serde_json::Value;

use crate::AppError;
use crate::Entry;
use crate::Error;
use crate::Level;
use crate::LogRecord;
#[cfg(feature = "bridge-log")]
use crate::trap::DefaultTrap;
#[cfg(feature = "bridge-log")]
use crate::trap::Trap;
use crate::writer::Writer;

/// The message of an error record logged with [`Logger::error_cause`].
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";

/// A logger writing JSON records to one [`Writer`].
///
/// Every record carries `_level`, `_timestamp`, the default settings fixed at construction and
/// the fields of the entry, in that order; entry fields win over default settings. Error records
/// may carry the unrolled cause as `rootCause`.
///
/// Each call writes exactly one line, and a failure of the writer is returned unchanged.
///
/// # Examples
///
/// ```
/// use logweave::AppError;
/// use logweave::Logger;
/// use logweave::writer::ConsoleWriter;
/// use serde_json::json;
///
/// let logger = Logger::builder()
///     .writer(ConsoleWriter::default())
///     .default_setting("source_application", "producer")
///     .build()
///     .unwrap();
///
/// logger.info("Starting to generate expressions for the consumer.").unwrap();
/// logger
///     .info(json!({"message": "Sending expression.", "expression": "3 * -4"}))
///     .unwrap();
/// logger
///     .error_cause(&AppError::new().with_message("Consumer is not responding."))
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct Logger {
    writer: Box<dyn Writer>,
    default_settings: Map<String, Value>,
    #[cfg(feature = "bridge-log")]
    pub(crate) trap: Box<dyn Trap>,
}

impl Logger {
    /// Create a logger with the given writer and default settings.
    pub fn new(writer: impl Into<Box<dyn Writer>>, default_settings: Map<String, Value>) -> Self {
        Self {
            writer: writer.into(),
            default_settings,
            #[cfg(feature = "bridge-log")]
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Create a new [`LoggerBuilder`].
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Log an informational entry.
    pub fn info(&self, entry: impl Into<Entry>) -> Result<(), Error> {
        self.log(Level::Info, entry.into(), None)
    }

    /// Log an error entry, attaching the unrolled `cause` when one is given.
    pub fn error(&self, entry: impl Into<Entry>, cause: Option<&AppError>) -> Result<(), Error> {
        self.log(Level::Error, entry.into(), cause)
    }

    /// Log `cause` under the message [`DEFAULT_ERROR_MESSAGE`].
    pub fn error_cause(&self, cause: &AppError) -> Result<(), Error> {
        self.error(DEFAULT_ERROR_MESSAGE, Some(cause))
    }

    /// Assemble the record that a call at `level` would write, stamped with the current time.
    pub fn record(
        &self,
        level: Level,
        entry: impl Into<Entry>,
        cause: Option<&AppError>,
    ) -> LogRecord {
        LogRecord::new(
            level,
            Timestamp::now(),
            &self.default_settings,
            entry.into(),
            cause,
        )
    }

    /// Flush the writer.
    pub fn flush(&self) -> Result<(), Error> {
        self.writer.flush()
    }

    /// Return the default settings attached to every record.
    pub fn default_settings(&self) -> &Map<String, Value> {
        &self.default_settings
    }

    /// Return the writer of this logger.
    pub fn writer(&self) -> &dyn Writer {
        self.writer.as_ref()
    }

    fn log(&self, level: Level, entry: Entry, cause: Option<&AppError>) -> Result<(), Error> {
        let line = self.record(level, entry, cause).to_json()?;
        self.writer.write(&line)
    }
}

/// A builder for configuring a [`Logger`].
#[derive(Debug, Default)]
#[must_use = "call `build` to finish setting up the logger"]
pub struct LoggerBuilder {
    writer: Option<Box<dyn Writer>>,
    default_settings: Option<Map<String, Value>>,
    #[cfg(feature = "bridge-log")]
    trap: Option<Box<dyn Trap>>,
}

impl LoggerBuilder {
    /// Set the writer receiving the serialized records.
    pub fn writer(mut self, writer: impl Into<Box<dyn Writer>>) -> Self {
        self.writer = Some(writer.into());
        self
    }

    /// Set the default settings, replacing any set before.
    ///
    /// Pass an empty map if no default settings are wanted.
    pub fn default_settings(mut self, default_settings: Map<String, Value>) -> Self {
        self.default_settings = Some(default_settings);
        self
    }

    /// Add one default setting.
    pub fn default_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_settings
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the trap for failures of records logged through the `log` facade, which cannot be
    /// returned to the caller.
    ///
    /// Default to [`DefaultTrap`].
    #[cfg(feature = "bridge-log")]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = Some(trap.into());
        self
    }

    /// Build the [`Logger`].
    ///
    /// # Errors
    ///
    /// Return an [`IllegalArgument`](crate::ErrorKind::IllegalArgument) error if the writer or
    /// the default settings were not provided.
    pub fn build(self) -> Result<Logger, Error> {
        let Some(writer) = self.writer else {
            return Err(Error::illegal_argument("Writer was not provided."));
        };
        let Some(default_settings) = self.default_settings else {
            return Err(
                Error::illegal_argument("Default settings were not provided.").with_detail(
                    "If you do not have default settings, you must supply an empty hash.",
                ),
            );
        };

        Ok(Logger {
            writer,
            default_settings,
            #[cfg(feature = "bridge-log")]
            trap: self
                .trap
                .unwrap_or_else(|| Box::new(DefaultTrap::default())),
        })
    }
}
