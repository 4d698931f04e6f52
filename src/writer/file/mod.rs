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

//! Writer for appending messages to time-rotated log files.
//!
//! # Example
//!
//!```
//! use logweave::Logger;
//! use logweave::writer::FileWriter;
//!
//! let file_writer = FileWriter::new("logs/", "producer", "json")
//!     .unwrap()
//!     .with_minute_rotation();
//!
//! let logger = Logger::new(file_writer, serde_json::Map::new());
//! logger.info("This log will be written to logs/producer_YYYY_MM_DD_HH_mm.json").unwrap();
//! ```

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::MAIN_SEPARATOR;
#[cfg(test)]
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::Timestamp;

pub use self::rotation::RotationStrategy;
use crate::Error;
use crate::trap::DefaultTrap;
use crate::trap::Trap;
use crate::writer::Writer;

mod rotation;

/// A writer that appends messages to a log file whose name is derived from the current UTC time.
///
/// The file name is `{base}_{YYYY}_{MM}_{DD}[_{HH}[_{mm}]].{extension}`, depending on the
/// [`RotationStrategy`]. Rotation is checked on every write: when the computed name differs from
/// the file currently open, that file is closed and the new one is opened in append mode. No
/// file is opened before the first write, and a quiet period that spans several rotation
/// boundaries produces a single rotation on the next write.
#[derive(Debug)]
pub struct FileWriter {
    log_directory: String,
    filename_base: String,
    filename_extension: String,
    state: Mutex<State>,
    clock: Clock,
    trap: Box<dyn Trap>,
}

#[derive(Debug)]
struct State {
    strategy: RotationStrategy,
    active: Option<ActiveFile>,
}

/// Source of the time that file names are derived from.
#[derive(Debug, Clone)]
enum Clock {
    System,
    /// Time shared with a test, which moves it by hand.
    #[cfg(test)]
    Manual(Arc<Mutex<Timestamp>>),
}

impl Clock {
    fn now(&self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Manual(now) => *now.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

#[derive(Debug)]
struct ActiveFile {
    filename: String,
    file: File,
}

impl FileWriter {
    /// Create a new file writer with day rotation.
    ///
    /// # Errors
    ///
    /// Return an [`IllegalArgument`](crate::ErrorKind::IllegalArgument) error if either:
    ///
    /// * `log_directory` is empty or does not end with a path separator.
    /// * `filename_base` is empty.
    /// * `filename_extension` is empty.
    pub fn new(
        log_directory: impl Into<String>,
        filename_base: impl Into<String>,
        filename_extension: impl Into<String>,
    ) -> Result<Self, Error> {
        let log_directory = log_directory.into();
        let filename_base = filename_base.into();
        let filename_extension = filename_extension.into();

        if log_directory.is_empty() {
            return Err(Error::illegal_argument("Logging directory was not provided."));
        }
        if !log_directory.ends_with('/') && !log_directory.ends_with(MAIN_SEPARATOR) {
            return Err(
                Error::illegal_argument("Log directory path must end with slash.")
                    .with_detail(format!(
                        "The log directory path [{log_directory}] must end with [/]."
                    ))
                    .with_context("log_directory", &log_directory),
            );
        }
        if filename_base.is_empty() {
            return Err(Error::illegal_argument("Filename base was not provided."));
        }
        if filename_extension.is_empty() {
            return Err(Error::illegal_argument("File extension was not provided."));
        }

        Ok(Self {
            log_directory,
            filename_base,
            filename_extension,
            state: Mutex::new(State {
                strategy: RotationStrategy::default(),
                active: None,
            }),
            clock: Clock::System,
            trap: Box::new(DefaultTrap::default()),
        })
    }

    /// Rotate log files every day. This is the default.
    pub fn enable_day_rotation(&self) {
        self.state().strategy = RotationStrategy::Day;
    }

    /// Rotate log files every hour.
    pub fn enable_hour_rotation(&self) {
        self.state().strategy = RotationStrategy::Hour;
    }

    /// Rotate log files every minute.
    pub fn enable_minute_rotation(&self) {
        self.state().strategy = RotationStrategy::Minute;
    }

    /// Set the rotation strategy.
    pub fn with_rotation(self, strategy: RotationStrategy) -> Self {
        self.state().strategy = strategy;
        self
    }

    /// Rotate log files every day.
    pub fn with_day_rotation(self) -> Self {
        self.with_rotation(RotationStrategy::Day)
    }

    /// Rotate log files every hour.
    pub fn with_hour_rotation(self) -> Self {
        self.with_rotation(RotationStrategy::Hour)
    }

    /// Rotate log files every minute.
    pub fn with_minute_rotation(self) -> Self {
        self.with_rotation(RotationStrategy::Minute)
    }

    /// Set the trap for errors that happen while closing a rotated file.
    ///
    /// Default to [`DefaultTrap`].
    pub fn with_trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Return the directory the log files are written to.
    pub fn log_directory(&self) -> &str {
        &self.log_directory
    }

    /// Return the current rotation strategy.
    pub fn rotation(&self) -> RotationStrategy {
        self.state().strategy
    }

    /// Return the name of the file currently open, if any.
    pub fn active_filename(&self) -> Option<String> {
        self.state().active.as_ref().map(|f| f.filename.clone())
    }

    /// Return the file name that a message written at `now` goes to.
    pub fn filename_at(&self, now: Timestamp) -> String {
        let strategy = self.state().strategy;
        self.filename_for(strategy, now)
    }

    fn filename_for(&self, strategy: RotationStrategy, now: Timestamp) -> String {
        format!(
            "{}_{}.{}",
            self.filename_base,
            strategy.date_stamp(now),
            self.filename_extension
        )
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open(&self, filename: String) -> Result<ActiveFile, Error> {
        fs::create_dir_all(&self.log_directory).map_err(|err| {
            Error::write_error("failed to create log directory")
                .with_context("log_directory", &self.log_directory)
                .with_source(err)
        })?;

        let filepath = format!("{}{}", self.log_directory, filename);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&filepath)
            .map_err(|err| {
                Error::write_error("failed to open log file")
                    .with_context("filepath", &filepath)
                    .with_source(err)
            })?;

        Ok(ActiveFile { filename, file })
    }

    fn close(&self, mut previous: ActiveFile) {
        if let Err(err) = previous.file.flush() {
            let err = Error::write_error("failed to flush previous log file")
                .with_context("filename", &previous.filename)
                .with_source(err);
            self.trap.trap(&err);
        }
    }
}

impl Writer for FileWriter {
    fn write(&self, message: &str) -> Result<(), Error> {
        let mut state = self.state();
        let State { strategy, active } = &mut *state;

        let target = self.filename_for(*strategy, self.clock.now());
        let current = match active.take() {
            Some(current) if current.filename == target => active.insert(current),
            previous => {
                if let Some(previous) = previous {
                    self.close(previous);
                }
                active.insert(self.open(target)?)
            }
        };

        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        current.file.write_all(line.as_bytes()).map_err(|err| {
            Error::from_io_error(err).with_context("filename", &current.filename)
        })
    }

    fn flush(&self) -> Result<(), Error> {
        match self.state().active.as_mut() {
            Some(current) => current.file.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = state.active.as_mut() {
            if let Err(err) = current.file.flush() {
                let err = Error::write_error("failed to flush file writer on dropped")
                    .with_context("filename", &current.filename)
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::sync::Mutex;

    use jiff::Span;
    use jiff::Timestamp;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    fn log_dir(temp_dir: &TempDir) -> String {
        format!("{}/", temp_dir.path().display())
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn manual_writer(
        temp_dir: &TempDir,
        start: Timestamp,
    ) -> (FileWriter, Arc<Mutex<Timestamp>>) {
        let now = Arc::new(Mutex::new(start));
        let writer = FileWriter::new(log_dir(temp_dir), "test_file", "log")
            .unwrap()
            .with_clock(Clock::Manual(now.clone()));
        (writer, now)
    }

    fn set_now(clock: &Mutex<Timestamp>, now: Timestamp) {
        *clock.lock().unwrap() = now;
    }

    fn list_files(temp_dir: &TempDir) -> Vec<String> {
        let mut files = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        files.sort();
        files
    }

    fn read(temp_dir: &TempDir, filename: &str) -> String {
        fs::read_to_string(temp_dir.path().join(filename)).unwrap()
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect()
    }

    #[derive(Debug, Default)]
    struct RecordingTrap {
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl Trap for RecordingTrap {
        fn trap(&self, err: &Error) {
            self.errors.lock().unwrap().push(err.to_string());
        }
    }

    #[test]
    fn test_filename_per_strategy() {
        let temp_dir = TempDir::new().unwrap();
        let writer = FileWriter::new(log_dir(&temp_dir), "app", "json").unwrap();
        let now = ts("2024-03-05T07:08:09Z");

        assert_eq!(writer.rotation(), RotationStrategy::Day);
        assert_eq!(writer.filename_at(now), "app_2024_03_05.json");

        writer.enable_hour_rotation();
        assert_eq!(writer.filename_at(now), "app_2024_03_05_07.json");

        writer.enable_minute_rotation();
        assert_eq!(writer.filename_at(now), "app_2024_03_05_07_08.json");

        writer.enable_day_rotation();
        assert_eq!(writer.filename_at(now), "app_2024_03_05.json");
    }

    #[test]
    fn test_last_rotation_call_wins() {
        let temp_dir = TempDir::new().unwrap();
        let writer = FileWriter::new(log_dir(&temp_dir), "app", "json")
            .unwrap()
            .with_minute_rotation()
            .with_hour_rotation();
        assert_eq!(writer.rotation(), RotationStrategy::Hour);
    }

    #[test]
    fn test_nothing_opened_before_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _) = manual_writer(&temp_dir, ts("2024-08-10T00:00:00Z"));
        assert_eq!(writer.active_filename(), None);
        assert!(list_files(&temp_dir).is_empty());

        writer.write("first").unwrap();
        assert_eq!(
            writer.active_filename().as_deref(),
            Some("test_file_2024_08_10.log")
        );
    }

    #[test]
    fn test_minute_rotation_across_minutes() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, now) = manual_writer(&temp_dir, ts("2024-08-10T12:30:59Z"));
        let writer = writer.with_minute_rotation();

        writer.write("one").unwrap();
        set_now(&now, ts("2024-08-10T12:31:00Z"));
        writer.write("two").unwrap();
        writer.flush().unwrap();

        assert_eq!(
            list_files(&temp_dir),
            vec![
                "test_file_2024_08_10_12_30.log".to_string(),
                "test_file_2024_08_10_12_31.log".to_string(),
            ]
        );
        assert_eq!(read(&temp_dir, "test_file_2024_08_10_12_30.log"), "one\n");
        assert_eq!(read(&temp_dir, "test_file_2024_08_10_12_31.log"), "two\n");
    }

    #[test]
    fn test_minute_rotation_within_minute_appends() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, now) = manual_writer(&temp_dir, ts("2024-08-10T12:30:01Z"));
        let writer = writer.with_minute_rotation();

        let mut expected = String::new();
        for i in 0..10 {
            set_now(&now, ts("2024-08-10T12:30:01Z") + Span::new().seconds(i * 5));
            let message = generate_random_string();
            writer.write(&message).unwrap();
            expected.push_str(&message);
            expected.push('\n');
        }
        writer.flush().unwrap();

        assert_eq!(list_files(&temp_dir), vec!["test_file_2024_08_10_12_30.log"]);
        assert_eq!(read(&temp_dir, "test_file_2024_08_10_12_30.log"), expected);
    }

    #[test]
    fn test_quiet_period_rotates_once() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, now) = manual_writer(&temp_dir, ts("2024-08-10T10:00:00Z"));
        let writer = writer.with_hour_rotation();

        writer.write("before").unwrap();
        set_now(&now, ts("2024-08-10T15:42:00Z"));
        writer.write("after").unwrap();

        assert_eq!(
            list_files(&temp_dir),
            vec!["test_file_2024_08_10_10.log", "test_file_2024_08_10_15.log"]
        );
    }

    #[test]
    fn test_rotation_back_to_previous_name_appends() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _) = manual_writer(&temp_dir, ts("2024-08-10T10:00:00Z"));

        writer.write("first").unwrap();
        writer.enable_hour_rotation();
        writer.write("second").unwrap();
        writer.enable_day_rotation();
        writer.write("third").unwrap();

        assert_eq!(read(&temp_dir, "test_file_2024_08_10.log"), "first\nthird\n");
        assert_eq!(read(&temp_dir, "test_file_2024_08_10_10.log"), "second\n");
    }

    #[test]
    fn test_existing_file_is_appended() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("test_file_2024_08_10.log"), "existing\n").unwrap();

        let (writer, _) = manual_writer(&temp_dir, ts("2024-08-10T10:00:00Z"));
        writer.write("appended").unwrap();

        assert_eq!(
            read(&temp_dir, "test_file_2024_08_10.log"),
            "existing\nappended\n"
        );
    }

    #[test]
    fn test_missing_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let nested = format!("{}/nested/logs/", temp_dir.path().display());
        let writer = FileWriter::new(nested.clone(), "app", "log").unwrap();

        writer.write("hello").unwrap();
        let filename = writer.active_filename().unwrap();
        assert_eq!(
            fs::read_to_string(format!("{nested}{filename}")).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_open_failure_is_write_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let writer = FileWriter::new(format!("{}/", blocker.display()), "app", "log")
            .unwrap()
            .with_trap(RecordingTrap::default());
        let err = writer.write("lost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteError);
        assert_eq!(writer.active_filename(), None);
    }

    #[test]
    fn test_rotation_does_not_trap_on_healthy_close() {
        let temp_dir = TempDir::new().unwrap();
        let trap = RecordingTrap::default();
        let errors = trap.errors.clone();
        let (writer, now) = manual_writer(&temp_dir, ts("2024-08-10T10:00:00Z"));
        let writer = writer.with_minute_rotation().with_trap(trap);

        for minute in 0..5 {
            set_now(&now, ts("2024-08-10T10:00:00Z") + Span::new().minutes(minute));
            writer.write("tick").unwrap();
        }

        assert_eq!(list_files(&temp_dir).len(), 5);
        assert!(errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_rotation_recovers_on_later_write() {
        let temp_dir = TempDir::new().unwrap();
        let trap = RecordingTrap::default();
        let errors = trap.errors.clone();
        let (writer, now) = manual_writer(&temp_dir, ts("2024-08-10T10:00:00Z"));
        let writer = writer.with_hour_rotation().with_trap(trap);

        writer.write("first").unwrap();
        assert_eq!(
            writer.active_filename().as_deref(),
            Some("test_file_2024_08_10_10.log")
        );

        // A directory in place of the next file makes the open fail.
        let blocker = temp_dir.path().join("test_file_2024_08_10_11.log");
        fs::create_dir(&blocker).unwrap();
        set_now(&now, ts("2024-08-10T11:00:00Z"));
        let err = writer.write("lost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteError);
        assert_eq!(err.message(), "failed to open log file");
        assert_eq!(writer.active_filename(), None);

        fs::remove_dir(&blocker).unwrap();
        writer.write("recovered").unwrap();
        writer.flush().unwrap();
        assert_eq!(
            writer.active_filename().as_deref(),
            Some("test_file_2024_08_10_11.log")
        );

        assert_eq!(read(&temp_dir, "test_file_2024_08_10_10.log"), "first\n");
        assert_eq!(read(&temp_dir, "test_file_2024_08_10_11.log"), "recovered\n");
        // Closing the previous file succeeded, so nothing reached the trap.
        assert!(errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        let err = FileWriter::new("/tmp/logs", "app", "log").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        assert_eq!(err.message(), "Log directory path must end with slash.");
        assert_eq!(err.context("log_directory"), Some("/tmp/logs"));

        let err = FileWriter::new("", "app", "log").unwrap_err();
        assert_eq!(err.message(), "Logging directory was not provided.");

        let err = FileWriter::new("/tmp/logs/", "", "log").unwrap_err();
        assert_eq!(err.message(), "Filename base was not provided.");

        let err = FileWriter::new("/tmp/logs/", "app", "").unwrap_err();
        assert_eq!(err.message(), "File extension was not provided.");

        assert!(FileWriter::new("/tmp/logs/", "app", "log").is_ok());
    }
}
