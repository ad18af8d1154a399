use std::fmt;

use serde_json::{Map, Value};

const INDENT: &str = "    ";

/// Nested validation report: field name to an ordered list of entries.
///
/// Fields keep the order in which they were first pushed. Each entry is
/// either a message or a report for a nested schema level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    fields: Vec<(String, Vec<ErrorEntry>)>,
}

/// One entry under a field in an [`ErrorReport`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEntry {
    /// A plain error message.
    Message(String),
    /// Errors for the fields of a nested mapping or the items of a list.
    Nested(ErrorReport),
}

impl ErrorReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` to the list for `field`, creating the field if needed.
    pub fn push(&mut self, field: impl Into<String>, entry: impl Into<ErrorEntry>) {
        let field = field.into();
        let entry = entry.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, entries)) => entries.push(entry),
            None => self.fields.push((field, vec![entry])),
        }
    }

    /// Records `message` under a field path such as `["db", "port"]`.
    ///
    /// Intermediate fields share one nested report, and a message already
    /// present at the same spot is not repeated.
    pub fn push_at(&mut self, path: &[String], message: impl Into<String>) {
        let message = message.into();
        let Some((field, rest)) = path.split_first() else {
            self.push(String::new(), message);
            return;
        };

        let entries = self.entries_mut(field);
        if rest.is_empty() {
            let entry = ErrorEntry::Message(message);
            if !entries.contains(&entry) {
                entries.push(entry);
            }
            return;
        }

        let index = match entries.iter().position(|e| matches!(e, ErrorEntry::Nested(_))) {
            Some(index) => index,
            None => {
                entries.push(ErrorEntry::Nested(ErrorReport::new()));
                entries.len() - 1
            }
        };
        if let ErrorEntry::Nested(nested) = &mut entries[index] {
            nested.push_at(rest, message);
        }
    }

    fn entries_mut(&mut self, field: &str) -> &mut Vec<ErrorEntry> {
        let index = match self.fields.iter().position(|(name, _)| name == field) {
            Some(index) => index,
            None => {
                self.fields.push((field.to_string(), Vec::new()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    /// Entries recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[ErrorEntry]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Fields and their entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorEntry])> {
        self.fields
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field has an error.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the report into a JSON tree of the same shape.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, entries)| {
                let entries = entries
                    .iter()
                    .map(|entry| match entry {
                        ErrorEntry::Message(message) => Value::String(message.clone()),
                        ErrorEntry::Nested(report) => report.to_value(),
                    })
                    .collect();
                (name.clone(), Value::Array(entries))
            })
            .collect();
        Value::Object(map)
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = INDENT.repeat(indent);
        for (field, entries) in &self.fields {
            for entry in entries {
                match entry {
                    ErrorEntry::Nested(report) => {
                        writeln!(f, "{pad}{field}:")?;
                        report.fmt_level(f, indent + 1)?;
                    }
                    ErrorEntry::Message(message) => writeln!(f, "{pad}{field}: {message}")?,
                }
            }
        }
        Ok(())
    }
}

/// Renders one line per message, nested levels indented by four spaces:
///
/// ```text
/// key1: error message
/// key2:
///     inner_key: error message
/// ```
impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_level(f, 0)
    }
}

impl From<&str> for ErrorEntry {
    fn from(message: &str) -> Self {
        ErrorEntry::Message(message.to_string())
    }
}

impl From<String> for ErrorEntry {
    fn from(message: String) -> Self {
        ErrorEntry::Message(message)
    }
}

impl From<ErrorReport> for ErrorEntry {
    fn from(report: ErrorReport) -> Self {
        ErrorEntry::Nested(report)
    }
}

/// Builds a report from a JSON tree shaped like `{"field": ["msg", {...}]}`.
///
/// Conversion is lenient: a non-array field value counts as a single entry,
/// non-string scalars are rendered with their JSON form, and a non-object
/// root yields an empty report.
impl From<Value> for ErrorReport {
    fn from(value: Value) -> Self {
        let mut report = ErrorReport::new();
        let Value::Object(map) = value else {
            return report;
        };
        for (field, entries) in map {
            let entries = match entries {
                Value::Array(items) => items,
                single => vec![single],
            };
            for entry in entries {
                match entry {
                    Value::Object(_) => report.push(field.clone(), ErrorReport::from(entry)),
                    Value::String(message) => report.push(field.clone(), message),
                    other => report.push(field.clone(), other.to_string()),
                }
            }
        }
        report
    }
}
