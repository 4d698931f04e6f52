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

//! Declarative setup of a [`Logger`].
//!
//! ```
//! use logweave::LoggingConfig;
//!
//! let config = LoggingConfig::from_json_str(
//!     r#"{"console": true, "defaultSettings": {"source_application": "producer"}}"#,
//! )
//! .unwrap();
//! let logger = config.build().unwrap();
//! logger.info("Configured.").unwrap();
//! ```

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::Error;
use crate::Logger;
use crate::writer::ConsoleWriter;
use crate::writer::FileWriter;
use crate::writer::MultiWriter;
use crate::writer::RotationStrategy;
use crate::writer::Writer;

/// Configuration of the sinks and default settings of a [`Logger`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether records are written to the console.
    #[serde(default)]
    pub console: bool,
    /// The rotating file sink, if any.
    #[serde(default)]
    pub file: Option<FileConfig>,
    /// Fields attached to every record.
    #[serde(default)]
    pub default_settings: Map<String, Value>,
}

/// Configuration of a [`FileWriter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    /// Directory of the log files, ending with a path separator.
    pub log_directory: String,
    /// File name prefix before the date stamp.
    pub filename_base: String,
    /// File extension, without the dot.
    pub filename_extension: String,
    /// Rotation granularity, `day` when omitted.
    #[serde(default)]
    pub rotation: RotationStrategy,
}

impl LoggingConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Return an [`IllegalArgument`](crate::ErrorKind::IllegalArgument) error if the input is
    /// not a valid configuration.
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|err| {
            Error::illegal_argument("failed to parse logging configuration").with_source(err)
        })
    }

    /// Read and parse a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::illegal_argument("failed to read logging configuration")
                .with_context("path", path.display())
                .with_source(err)
        })?;
        Self::from_json_str(&content).map_err(|err| err.with_context("path", path.display()))
    }

    /// Build the configured [`Logger`].
    ///
    /// A single sink is used directly; with both, records go to the console first and then to
    /// the file.
    ///
    /// # Errors
    ///
    /// Return an [`IllegalState`](crate::ErrorKind::IllegalState) error if no sink is enabled,
    /// or the error of [`FileWriter::new`] if the file sink is invalid.
    pub fn build(&self) -> Result<Logger, Error> {
        let mut writers: Vec<Box<dyn Writer>> = vec![];
        if self.console {
            writers.push(Box::new(ConsoleWriter::new()));
        }
        if let Some(file) = &self.file {
            let writer = FileWriter::new(
                &file.log_directory,
                &file.filename_base,
                &file.filename_extension,
            )?
            .with_rotation(file.rotation);
            writers.push(Box::new(writer));
        }

        let writer: Box<dyn Writer> = match writers.len() {
            0 => {
                return Err(Error::illegal_state("No log sink was configured.")
                    .with_detail("Enable the console or configure a file."));
            }
            1 => writers.remove(0),
            _ => Box::new(writers.into_iter().collect::<MultiWriter>()),
        };

        Logger::builder()
            .writer(writer)
            .default_settings(self.default_settings.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_full_config() {
        let config = LoggingConfig::from_json_str(
            r#"{
                "console": true,
                "file": {
                    "logDirectory": "logs/",
                    "filenameBase": "producer",
                    "filenameExtension": "json",
                    "rotation": "minute"
                },
                "defaultSettings": {"source_application": "producer"}
            }"#,
        )
        .unwrap();

        assert!(config.console);
        let file = config.file.as_ref().unwrap();
        assert_eq!(file.log_directory, "logs/");
        assert_eq!(file.rotation, RotationStrategy::Minute);
        assert_eq!(config.default_settings["source_application"], json!("producer"));
    }

    #[test]
    fn test_parse_defaults() {
        let config = LoggingConfig::from_json_str(
            r#"{"file": {"logDirectory": "logs/", "filenameBase": "b", "filenameExtension": "log"}}"#,
        )
        .unwrap();
        assert!(!config.console);
        assert_eq!(config.file.unwrap().rotation, RotationStrategy::Day);
        assert!(config.default_settings.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in [
            r#"{"consol": true}"#,
            r#"{"file": {"logDirectory": "logs/"}}"#,
            r#"{"file": {"logDirectory": "l/", "filenameBase": "b", "filenameExtension": "e", "rotation": "week"}}"#,
            "not json",
        ] {
            let err = LoggingConfig::from_json_str(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IllegalArgument, "{input}");
        }
    }

    #[test]
    fn test_build_without_sinks() {
        let err = LoggingConfig::default().build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn test_build_propagates_file_validation() {
        let config = LoggingConfig {
            file: Some(FileConfig {
                log_directory: "/tmp/logs".to_string(),
                filename_base: "producer".to_string(),
                filename_extension: "json".to_string(),
                rotation: RotationStrategy::Day,
            }),
            ..Default::default()
        };
        let err = config.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        assert_eq!(err.message(), "Log directory path must end with slash.");
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logging.json");
        std::fs::write(&path, r#"{"console": true}"#).unwrap();

        let config = LoggingConfig::from_json_file(&path).unwrap();
        assert!(config.console);

        let err = LoggingConfig::from_json_file(temp_dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        assert!(err.context("path").is_some());
    }
}
