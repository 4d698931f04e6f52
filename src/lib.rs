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

//! Logweave is a structured logging library writing one JSON object per line to pluggable
//! writers.
//!
//! # Overview
//!
//! A [`Logger`] assembles records from a level, a timestamp, default settings fixed at
//! construction and the entry given at the call site. Error records may carry an [`AppError`]
//! whose chain of causes is flattened into nested `rootCause` objects. The serialized record is
//! handed to a [`Writer`]: the console, a lazily rotated file, or a [`MultiWriter`] fanning out
//! to several of them.
//!
//! There is no global logger; construct one and pass it to the code that logs.
//!
//! # Examples
//!
//! ```
//! use logweave::AppError;
//! use logweave::Logger;
//! use logweave::writer::ConsoleWriter;
//! use logweave::writer::FileWriter;
//! use logweave::writer::MultiWriter;
//!
//! let file = FileWriter::new("logs/", "producer", "json")
//!     .unwrap()
//!     .with_minute_rotation();
//! let writer = MultiWriter::new()
//!     .with_writer(ConsoleWriter::new())
//!     .with_writer(file);
//!
//! let logger = Logger::builder()
//!     .writer(writer)
//!     .default_setting("source_application", "producer")
//!     .build()
//!     .unwrap();
//!
//! logger.info("Starting to generate expressions for the consumer.").unwrap();
//! logger
//!     .error("Failed to send.", Some(&AppError::new().with_type("App.Consumer.Unavailable")))
//!     .unwrap();
//! ```
//!
//! [`MultiWriter`]: writer::MultiWriter

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
pub use error::Error;
pub use error::ErrorKind;

pub mod trap;
pub use trap::Trap;

pub mod writer;
pub use writer::Writer;

mod app_error;
pub use app_error::AppError;
pub use app_error::MAX_UNROLL_DEPTH;

mod record;
pub use record::Entry;
pub use record::Level;
pub use record::LogRecord;

mod logger;
pub use logger::DEFAULT_ERROR_MESSAGE;
pub use logger::Logger;
pub use logger::LoggerBuilder;

#[cfg(feature = "bridge-log")]
mod bridge;

pub mod config;
pub use config::LoggingConfig;
