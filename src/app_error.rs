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

use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::fmt;

use serde_json::Map;
use serde_json::Value;

/// The maximum number of nested `rootCause` levels emitted for one record.
pub const MAX_UNROLL_DEPTH: usize = 16;

/// A structured application error that can be attached to an error record.
///
/// Unset fields take the defaults `type: "Application"`, `message: "An error occurred."` and
/// empty `detail`, `extendedInfo` and `errorCode`.
///
/// # Examples
///
/// ```
/// use logweave::AppError;
///
/// let cause = AppError::new()
///     .with_type("App.Consumer.Unavailable")
///     .with_message("The consumer could not be reached.")
///     .with_detail("Connection refused on localhost:9090.");
///
/// let error = AppError::new()
///     .with_type("App.Producer.SendFailed")
///     .with_message("Expression could not be sent.")
///     .with_root_cause(cause);
///
/// assert_eq!(error.root_cause().unwrap().error_type(), "App.Consumer.Unavailable");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppError {
    error_type: String,
    message: String,
    detail: String,
    extended_info: String,
    error_code: String,
    properties: Map<String, Value>,
    stack: Option<String>,
    root_cause: Option<Box<AppError>>,
}

impl Default for AppError {
    fn default() -> Self {
        Self {
            error_type: "Application".to_string(),
            message: "An error occurred.".to_string(),
            detail: String::new(),
            extended_info: String::new(),
            error_code: String::new(),
            properties: Map::new(),
            stack: None,
            root_cause: None,
        }
    }
}

impl AppError {
    /// Create a new error with default fields, capturing a backtrace as its stack when
    /// backtraces are enabled (`RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`).
    pub fn new() -> Self {
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            stack,
            ..Self::default()
        }
    }

    /// Convert a standard error and its chain of sources.
    ///
    /// Each level becomes an error of type `"Error"` whose message is the `Display` output of
    /// that level.
    pub fn from_std_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = vec![];
        let mut current = Some(err);
        while let Some(err) = current {
            // One level past the cap, so that unrolling flags the truncation.
            if chain.len() == MAX_UNROLL_DEPTH + 1 {
                break;
            }
            chain.push(err.to_string());
            current = err.source();
        }

        chain.into_iter().rev().fold(None, |cause, message| {
            let error = AppError::default()
                .with_type("Error")
                .with_message(message);
            Some(match cause {
                Some(cause) => error.with_root_cause(cause),
                None => error,
            })
        })
        .unwrap_or_default()
    }

    /// Set the type of the error.
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    /// Set the reason the error occurred.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set an explanation of the error.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Set additional information about the error context.
    pub fn with_extended_info(mut self, extended_info: impl Into<String>) -> Self {
        self.extended_info = extended_info.into();
        self
    }

    /// Set a custom code for this kind of error.
    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = error_code.into();
        self
    }

    /// Attach the error that caused this one.
    pub fn with_root_cause(mut self, root_cause: AppError) -> Self {
        self.root_cause = Some(Box::new(root_cause));
        self
    }

    /// Set the stack trace, replacing any captured one.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Add an extra property, recorded next to the standard fields.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Return the type of the error.
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// Return the reason the error occurred.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Return the explanation of the error.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Return the additional context information.
    pub fn extended_info(&self) -> &str {
        &self.extended_info
    }

    /// Return the custom error code.
    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// Return the stack trace, if one was captured or set.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Return the error that caused this one, if any.
    pub fn root_cause(&self) -> Option<&AppError> {
        self.root_cause.as_deref()
    }

    /// Return the extra property `key`, if set.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Flatten this error and its chain of root causes into nested JSON objects.
    ///
    /// At most [`MAX_UNROLL_DEPTH`] levels are emitted; when deeper causes are dropped the
    /// deepest emitted level carries `"rootCauseTruncated": true`.
    pub fn unroll(&self) -> Map<String, Value> {
        self.unroll_at(1)
    }

    fn unroll_at(&self, depth: usize) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("type".to_string(), Value::from(self.error_type.as_str()));
        data.insert("message".to_string(), Value::from(self.message.as_str()));
        data.insert("detail".to_string(), Value::from(self.detail.as_str()));
        data.insert(
            "extendedInfo".to_string(),
            Value::from(self.extended_info.as_str()),
        );
        data.insert("errorCode".to_string(), Value::from(self.error_code.as_str()));
        for (key, value) in &self.properties {
            data.insert(key.clone(), value.clone());
        }

        if let Some(stack) = &self.stack {
            data.entry("stack")
                .or_insert_with(|| Value::from(stack.as_str()));
        }

        if let Some(root_cause) = &self.root_cause {
            if depth < MAX_UNROLL_DEPTH {
                let unrolled = root_cause.unroll_at(depth + 1);
                data.insert("rootCause".to_string(), Value::Object(unrolled));
            } else {
                data.insert("rootCauseTruncated".to_string(), Value::Bool(true));
            }
        }

        data
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.root_cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chain(depth: usize) -> AppError {
        (1..depth).rev().fold(
            AppError::default()
                .with_message(format!("level {depth}"))
                .with_stack(format!("stack {depth}")),
            |cause, level| {
                AppError::default()
                    .with_message(format!("level {level}"))
                    .with_stack(format!("stack {level}"))
                    .with_root_cause(cause)
            },
        )
    }

    fn depth_of(mut data: &Map<String, Value>) -> usize {
        let mut depth = 1;
        while let Some(Value::Object(next)) = data.get("rootCause") {
            data = next;
            depth += 1;
        }
        depth
    }

    #[test]
    fn test_defaults() {
        let data = AppError::default().unroll();
        assert_eq!(
            Value::Object(data),
            json!({
                "type": "Application",
                "message": "An error occurred.",
                "detail": "",
                "extendedInfo": "",
                "errorCode": "",
            })
        );
    }

    #[test]
    fn test_unroll_depth_three_keeps_stacks() {
        let data = chain(3).unroll();
        assert_eq!(depth_of(&data), 3);

        assert_eq!(data["message"], json!("level 1"));
        assert_eq!(data["stack"], json!("stack 1"));
        let second = data["rootCause"].as_object().unwrap();
        assert_eq!(second["message"], json!("level 2"));
        assert_eq!(second["stack"], json!("stack 2"));
        let third = second["rootCause"].as_object().unwrap();
        assert_eq!(third["message"], json!("level 3"));
        assert_eq!(third["stack"], json!("stack 3"));
        assert!(third.get("rootCause").is_none());
    }

    #[test]
    fn test_unroll_is_capped() {
        let data = chain(MAX_UNROLL_DEPTH + 4).unroll();
        assert_eq!(depth_of(&data), MAX_UNROLL_DEPTH);

        let mut deepest = &data;
        while let Some(Value::Object(next)) = deepest.get("rootCause") {
            deepest = next;
        }
        assert_eq!(deepest["rootCauseTruncated"], json!(true));
        assert_eq!(deepest["message"], json!(format!("level {MAX_UNROLL_DEPTH}")));
    }

    #[test]
    fn test_chain_at_cap_is_not_truncated() {
        let data = chain(MAX_UNROLL_DEPTH).unroll();
        assert_eq!(depth_of(&data), MAX_UNROLL_DEPTH);

        let mut level = &data;
        loop {
            assert!(level.get("rootCauseTruncated").is_none());
            match level.get("rootCause") {
                Some(Value::Object(next)) => level = next,
                _ => break,
            }
        }
    }

    #[test]
    fn test_properties_and_explicit_stack() {
        let data = AppError::default()
            .with_error_code("E42")
            .with_property("statusCode", 503)
            .with_property("stack", "from property")
            .with_stack("from field")
            .unroll();

        assert_eq!(data["errorCode"], json!("E42"));
        assert_eq!(data["statusCode"], json!(503));
        // A stack recorded as a property is kept as is.
        assert_eq!(data["stack"], json!("from property"));
    }

    #[test]
    fn test_from_std_error_keeps_sources() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("request failed")
            }
        }

        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::other("connection refused"));
        let converted = AppError::from_std_error(&err);
        assert_eq!(converted.error_type(), "Error");
        assert_eq!(converted.message(), "request failed");
        let cause = converted.root_cause().unwrap();
        assert_eq!(cause.message(), "connection refused");
        assert!(cause.root_cause().is_none());
    }

    #[test]
    fn test_std_error_source_is_root_cause() {
        let error = AppError::default().with_root_cause(AppError::default().with_message("inner"));
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "Application: inner");
    }
}
