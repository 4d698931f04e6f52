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

use std::time::Duration;

use logweave::AppError;
use logweave::Logger;
use logweave::writer::ConsoleWriter;
use logweave::writer::FileWriter;
use logweave::writer::MultiWriter;
use serde_json::json;

fn main() {
    let file = FileWriter::new("logs/", "producer", "json")
        .unwrap()
        .with_minute_rotation();
    let writer = MultiWriter::new()
        .with_writer(ConsoleWriter::new())
        .with_writer(file);

    let logger = Logger::builder()
        .writer(writer)
        .default_setting("source_application", "producer")
        .build()
        .unwrap();

    logger
        .info("Starting to generate expressions for the consumer.")
        .unwrap();

    let repeat = 3;
    for i in 0..repeat {
        let expression = format!("{} * {}", i, -4);
        logger
            .info(json!({"message": "Sending expression.", "expression": expression.as_str()}))
            .unwrap();

        let cause = AppError::new()
            .with_type("App.Consumer.Unavailable")
            .with_message("The consumer could not be reached.")
            .with_detail("Connection refused on localhost:9090.");
        let error = AppError::new()
            .with_type("App.Producer.SendFailed")
            .with_message("Expression could not be sent.")
            .with_property("expression", expression)
            .with_root_cause(cause);
        logger.error_cause(&error).unwrap();

        if i + 1 < repeat {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}
