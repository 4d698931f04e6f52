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

//! Bridge from the `log` facade.
//!
//! A [`Logger`] can be installed as the `log` crate's global logger by the application:
//!
//! ```
//! use logweave::Logger;
//! use logweave::writer::ConsoleWriter;
//!
//! let logger = Logger::new(ConsoleWriter::new(), serde_json::Map::new());
//! log::set_boxed_logger(Box::new(logger)).unwrap();
//! log::set_max_level(log::LevelFilter::Info);
//!
//! log::info!(expression = "3 * -4"; "Sending expression.");
//! ```

use serde_json::Map;
use serde_json::Value;

use crate::Logger;

impl log::Log for Logger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::from(record.args().to_string()));
        fields.insert("target".to_string(), Value::from(record.target()));
        fields.insert("logLevel".to_string(), Value::from(record.level().as_str()));
        if let Some(module_path) = record.module_path() {
            fields.insert("modulePath".to_string(), Value::from(module_path));
        }
        if let Some(file) = record.file() {
            fields.insert("file".to_string(), Value::from(file));
        }
        if let Some(line) = record.line() {
            fields.insert("line".to_string(), Value::from(line));
        }

        struct KeyValueVisitor<'a> {
            fields: &'a mut Map<String, Value>,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor<'_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                let value =
                    serde_json::to_value(&value).unwrap_or_else(|_| Value::from(value.to_string()));
                self.fields.insert(key.as_str().to_string(), value);
                Ok(())
            }
        }

        let mut visitor = KeyValueVisitor {
            fields: &mut fields,
        };
        if let Err(err) = record.key_values().visit(&mut visitor) {
            let err = crate::Error::new(crate::ErrorKind::Unexpected, "failed to visit key values")
                .with_source(err);
            self.trap.trap(&err);
        }

        let result = match record.level() {
            log::Level::Error => self.error(fields, None),
            _ => self.info(fields),
        };
        if let Err(err) = result {
            self.trap.trap(&err);
        }
    }

    fn flush(&self) {
        if let Err(err) = Logger::flush(self) {
            self.trap.trap(&err);
        }
    }
}
