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

//! Sinks for serialized log records.

use std::fmt;
use std::sync::Arc;

use crate::Error;

mod console;
pub mod file;
mod multi;
#[cfg(feature = "non-blocking")]
pub mod non_blocking;

pub use self::console::ConsoleWriter;
pub use self::file::FileWriter;
pub use self::file::RotationStrategy;
pub use self::multi::MultiWriter;

/// A sink that records serialized messages.
///
/// Writers must be usable right after construction and must not assume they are the only
/// consumer of their sink.
pub trait Writer: fmt::Debug + Send + Sync + 'static {
    /// Write one serialized message to the sink.
    fn write(&self, message: &str) -> Result<(), Error>;

    /// Flush any buffered messages.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Writer> From<T> for Box<dyn Writer> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A shared writer, so that the same sink can be registered with several loggers or several
/// times with one [`MultiWriter`].
impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, message: &str) -> Result<(), Error> {
        (**self).write(message)
    }

    fn flush(&self) -> Result<(), Error> {
        (**self).flush()
    }
}
