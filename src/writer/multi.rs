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

use crate::Error;
use crate::writer::Writer;

/// A writer that delivers every message to all of its child writers.
///
/// Children are invoked in registration order. A failing child does not stop delivery to the
/// children after it; once all of them have been attempted, the last failure is returned and
/// earlier ones are dropped.
///
/// # Examples
///
/// ```
/// use logweave::writer::ConsoleWriter;
/// use logweave::writer::FileWriter;
/// use logweave::writer::MultiWriter;
///
/// let writer = MultiWriter::new()
///     .with_writer(ConsoleWriter::default())
///     .with_writer(FileWriter::new("logs/", "producer", "json").unwrap());
/// assert_eq!(writer.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MultiWriter {
    writers: Vec<Box<dyn Writer>>,
}

impl MultiWriter {
    /// Create a multi writer with no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more child writer.
    ///
    /// The same sink may be registered multiple times through an [`Arc`](std::sync::Arc); each
    /// registration receives its own copy of every message.
    pub fn add_writer(&mut self, writer: impl Into<Box<dyn Writer>>) {
        self.writers.push(writer.into());
    }

    /// Register one more child writer, consuming and returning the multi writer.
    pub fn with_writer(mut self, writer: impl Into<Box<dyn Writer>>) -> Self {
        self.add_writer(writer);
        self
    }

    /// Return the number of registered child writers.
    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Return `true` if no child writer is registered.
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    fn for_each_writer(&self, f: impl Fn(&dyn Writer) -> Result<(), Error>) -> Result<(), Error> {
        if self.writers.is_empty() {
            return Err(Error::illegal_state("No writers were registered."));
        }

        let mut last_error = None;
        for writer in &self.writers {
            if let Err(err) = f(writer.as_ref()) {
                last_error = Some(err);
            }
        }

        match last_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl<W: Into<Box<dyn Writer>>> FromIterator<W> for MultiWriter {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        Self {
            writers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Writer for MultiWriter {
    fn write(&self, message: &str) -> Result<(), Error> {
        self.for_each_writer(|writer| writer.write(message))
    }

    fn flush(&self) -> Result<(), Error> {
        self.for_each_writer(|writer| writer.flush())
    }
}
