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

use std::io::Write;

use jiff::Zoned;

use crate::Error;
use crate::writer::Writer;

/// A writer that prints messages to stderr, prefixed with the local date and time.
///
/// Output format:
///
/// ```text
/// 14 Oct 09:15:00 - {"_level":"info","_timestamp":"Wed, 14 Oct 2026 09:15:00 GMT","message":"Hello"}
/// ```
///
/// Failures to write to stderr are ignored.
///
/// # Examples
///
/// ```
/// use logweave::writer::ConsoleWriter;
///
/// let console_writer = ConsoleWriter::default();
/// ```
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct ConsoleWriter {}

impl ConsoleWriter {
    /// Create a new console writer.
    pub fn new() -> Self {
        Self::default()
    }
}

fn format_line(now: &Zoned, message: &str) -> String {
    format!("{} - {message}\n", now.strftime("%-d %b %H:%M:%S"))
}

impl Writer for ConsoleWriter {
    fn write(&self, message: &str) -> Result<(), Error> {
        let line = format_line(&Zoned::now(), message);
        let _ = std::io::stderr().write_all(line.as_bytes());
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let _ = std::io::stderr().flush();
        Ok(())
    }
}
