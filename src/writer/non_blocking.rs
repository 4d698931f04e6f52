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

//! A writer that hands messages to a dedicated thread.
//!
//! # Example
//!
//! ```
//! use logweave::Logger;
//! use logweave::writer::ConsoleWriter;
//! use logweave::writer::non_blocking::NonBlockingBuilder;
//!
//! let (non_blocking, _guard) = NonBlockingBuilder::new("logweave-console", ConsoleWriter::new())
//!     .build()
//!     .unwrap();
//!
//! let logger = Logger::new(non_blocking, serde_json::Map::new());
//! logger.info("Written by the logging thread.").unwrap();
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvError;
use crossbeam_channel::SendTimeoutError;
use crossbeam_channel::Sender;
use crossbeam_channel::TryRecvError;
use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;

use crate::Error;
use crate::trap::DefaultTrap;
use crate::trap::Trap;
use crate::writer::Writer;

#[derive(Debug)]
enum Message {
    Record(String),
    Flush(Sender<()>),
    Shutdown,
}

/// A guard that flushes messages associated with a [`NonBlocking`] writer on drop.
///
/// Writing to a [`NonBlocking`] writer does **not** immediately reach the underlying writer.
/// The message is written by a dedicated thread at some later point, and failures of the
/// underlying writer are reported to the trap instead of the caller. If the program terminates
/// abruptly, some messages may not be written.
///
/// Keep the guard alive in `main` so that dropping it drains the pending messages.
#[derive(Debug)]
pub struct WorkerGuard {
    _guard: Option<JoinHandle<()>>,
    sender: Sender<Message>,
    shutdown: Sender<()>,
    shutdown_timeout: Duration,
    trap: Arc<dyn Trap>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let shutdown_timeout = self.shutdown_timeout;
        match self
            .sender
            .send_timeout(Message::Shutdown, shutdown_timeout)
        {
            Ok(()) => {
                // Attempt to wait for `Worker` to write all messages before dropping. This
                // happens when the `Worker` calls `recv()` on a zero-capacity channel.
                let _ = self.shutdown.send_timeout((), shutdown_timeout);
            }
            Err(SendTimeoutError::Disconnected(_)) => (),
            Err(SendTimeoutError::Timeout(_)) => {
                let err = Error::write_error("failed to send shutdown signal to logging worker")
                    .with_context("timeout", format!("{shutdown_timeout:?}"));
                self.trap.trap(&err);
            }
        }
    }
}

/// A writer that forwards messages to a logging thread.
///
/// [`flush`](Writer::flush) blocks until the worker has written every message sent before it
/// and flushed the underlying writer.
#[derive(Clone, Debug)]
pub struct NonBlocking {
    sender: Sender<Message>,
}

impl Writer for NonBlocking {
    fn write(&self, message: &str) -> Result<(), Error> {
        self.sender
            .send(Message::Record(message.to_string()))
            .map_err(|_| Error::write_error("failed to send log message to logging worker"))
    }

    fn flush(&self) -> Result<(), Error> {
        let (done, flushed) = bounded(1);
        self.sender
            .send(Message::Flush(done))
            .map_err(|_| Error::write_error("failed to send flush request to logging worker"))?;
        // The worker drops the sender without answering when the flush fails.
        flushed
            .recv()
            .map_err(|_| Error::write_error("logging worker failed to flush"))
    }
}

/// A builder for configuring [`NonBlocking`].
#[derive(Debug)]
pub struct NonBlockingBuilder<W: Writer> {
    thread_name: String,
    buffered_lines_limit: Option<usize>,
    shutdown_timeout: Option<Duration>,
    trap: Box<dyn Trap>,
    writer: W,
}

impl<W: Writer> NonBlockingBuilder<W> {
    /// Create a new [`NonBlockingBuilder`] moving `writer` onto a thread named `thread_name`.
    pub fn new(thread_name: impl Into<String>, writer: W) -> Self {
        Self {
            thread_name: thread_name.into(),
            buffered_lines_limit: None,
            shutdown_timeout: None,
            trap: Box::new(DefaultTrap::default()),
            writer,
        }
    }

    /// Set the buffer size of pending messages.
    ///
    /// When the buffer is full, writes block until the logging thread catches up. Default to
    /// unbounded.
    pub fn buffered_lines_limit(mut self, buffered_lines_limit: Option<usize>) -> Self {
        self.buffered_lines_limit = buffered_lines_limit;
        self
    }

    /// Set the shutdown timeout before the worker guard dropped.
    ///
    /// Default to 100 milliseconds.
    pub fn shutdown_timeout(mut self, shutdown_timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Set the trap receiving failures of the underlying writer.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Complete the builder, spawning the logging thread.
    ///
    /// # Errors
    ///
    /// Return an [`IllegalState`](crate::ErrorKind::IllegalState) error if the thread cannot be
    /// spawned.
    pub fn build(self) -> Result<(NonBlocking, WorkerGuard), Error> {
        const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

        let Self {
            thread_name,
            buffered_lines_limit,
            shutdown_timeout,
            trap,
            writer,
        } = self;

        let (sender, receiver) = match buffered_lines_limit {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };
        let (shutdown_sender, shutdown_receiver) = bounded(0);

        let trap: Arc<dyn Trap> = Arc::from(trap);
        let worker = Worker {
            writer,
            receiver,
            shutdown: shutdown_receiver,
            trap: trap.clone(),
        };
        let handle = worker.make_thread(thread_name)?;

        let guard = WorkerGuard {
            _guard: Some(handle),
            sender: sender.clone(),
            shutdown: shutdown_sender,
            shutdown_timeout: shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            trap,
        };
        Ok((NonBlocking { sender }, guard))
    }
}

struct Worker<W: Writer> {
    writer: W,
    receiver: Receiver<Message>,
    shutdown: Receiver<()>,
    trap: Arc<dyn Trap>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WorkerState {
    Empty,
    Disconnected,
    Continue,
    Shutdown,
}

impl<W: Writer> Worker<W> {
    fn handle(&self, message: Result<Message, TryRecvError>) -> Result<WorkerState, Error> {
        match message {
            Ok(Message::Record(record)) => {
                self.writer.write(&record)?;
                Ok(WorkerState::Continue)
            }
            Ok(Message::Flush(done)) => {
                match self.writer.flush() {
                    Ok(()) => {
                        let _ = done.send(());
                    }
                    // Trapped before `done` is dropped, so the caller wakes up after the report.
                    Err(err) => self.trap.trap(&err),
                }
                Ok(WorkerState::Continue)
            }
            Ok(Message::Shutdown) => Ok(WorkerState::Shutdown),
            Err(TryRecvError::Empty) => Ok(WorkerState::Empty),
            Err(TryRecvError::Disconnected) => Ok(WorkerState::Disconnected),
        }
    }

    fn work(&self) -> Result<WorkerState, Error> {
        let message = self
            .receiver
            .recv()
            .map_err(|RecvError| TryRecvError::Disconnected);
        let mut worker_state = self.handle(message)?;

        while worker_state == WorkerState::Continue {
            worker_state = self.handle(self.receiver.try_recv())?;
        }

        self.writer.flush()?;
        Ok(worker_state)
    }

    fn make_thread(self, name: String) -> Result<JoinHandle<()>, Error> {
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                loop {
                    match self.work() {
                        Ok(WorkerState::Continue) | Ok(WorkerState::Empty) => {}
                        Ok(WorkerState::Shutdown) | Ok(WorkerState::Disconnected) => {
                            let _ = self.shutdown.recv();
                            break;
                        }
                        Err(err) => self.trap.trap(&err),
                    }
                }
                if let Err(err) = self.writer.flush() {
                    self.trap.trap(&err);
                }
            })
            .map_err(|err| {
                Error::illegal_state("failed to spawn the logging thread")
                    .with_context("thread_name", name)
                    .with_source(err)
            })
    }
}
