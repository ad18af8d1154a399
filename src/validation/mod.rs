//! Schema validation hooks and error reporting.
//!
//! A [`Validator`] checks a decoded tree before it is merged into a
//! [`ConfigNode`](crate::ConfigNode). Rejections come back as an
//! [`ErrorReport`], which [`ValidationError`] wraps and renders.

mod report;
#[cfg(feature = "validation")]
mod schema;

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

pub use report::{ErrorEntry, ErrorReport};
#[cfg(feature = "validation")]
pub use schema::SchemaValidator;

/// Cerberus-style schema: field name to a mapping of rules.
pub type Schema = Map<String, Value>;

/// Checks a decoded config tree.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Returns the per-field errors when `data` is rejected.
    fn validate(&self, data: &Map<String, Value>) -> Result<(), ErrorReport>;
}

/// Config data rejected by a validator.
///
/// `Display` prefixes a one-line summary; [`message`](Self::message) is the
/// bare indented report.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config failed validation:\n{payload}")]
pub struct ValidationError {
    payload: ErrorReport,
}

impl ValidationError {
    /// Wraps a report, or anything convertible into one.
    pub fn new(payload: impl Into<ErrorReport>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The per-field errors.
    pub fn payload(&self) -> &ErrorReport {
        &self.payload
    }

    /// Consumes the error and returns the report.
    pub fn into_payload(self) -> ErrorReport {
        self.payload
    }

    /// Human-readable, indented rendering of the payload.
    pub fn message(&self) -> String {
        self.payload.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_matches_payload_rendering() {
        let err = ValidationError::new(json!({
            "l1": [{"l2": [{"l3": ["value"]}]}],
            "foo": ["bar"]
        }));

        let message = err.message();
        assert!(message.contains("foo: bar\n"));
        assert!(message.starts_with("l1:\n    l2:\n        l3: value\n"));
        assert!(message.lines().all(|line| !line.is_empty()));
    }

    #[test]
    fn test_display_has_summary_line() {
        let mut payload = ErrorReport::new();
        payload.push("arr", "unknown field");
        let err = ValidationError::new(payload);

        assert_eq!(err.to_string(), "config failed validation:\narr: unknown field\n");
        assert_eq!(err.payload().get("arr"), Some(&[ErrorEntry::from("unknown field")][..]));
    }
}
