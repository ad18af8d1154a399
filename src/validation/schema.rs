//! Built-in validator for Cerberus-style schemas.
//!
//! A schema maps field names to rule sets:
//!
//! ```text
//! {
//!     "name": {"type": "string", "required": true, "minlength": 1},
//!     "db":   {"type": "dict", "schema": {"port": {"type": "integer", "min": 1}}},
//!     "tags": {"type": "list", "schema": {"type": "string"}}
//! }
//! ```
//!
//! Supported rules: `type`, `required`, `nullable`, `empty`, `allowed`,
//! `min`, `max`, `minlength`, `maxlength`, `regex`, `schema`,
//! `allow_unknown` and `meta`. The rules are translated into a draft 7 JSON
//! Schema and checked by the `jsonschema` crate; its errors are folded back
//! into a nested [`ErrorReport`] keyed by field name.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{ErrorReport, Schema, Validator};
use crate::ConfigError;

/// Annotation holding the Cerberus type names, used in messages.
const TYPES_KEY: &str = "x-types";
/// Annotation holding the unanchored `regex` rule, used in messages.
const REGEX_KEY: &str = "x-regex";

/// [`Validator`] compiled from a Cerberus-style [`Schema`].
///
/// Fields present in the data but absent from the schema are reported as
/// `unknown field`, unless the validator was built with
/// [`allowing_unknown`](Self::allowing_unknown) (or, for nested mappings,
/// the `allow_unknown` rule is set).
pub struct SchemaValidator {
    schema: Value,
    compiled: JSONSchema,
}

impl SchemaValidator {
    /// Compiles `schema`. Fails with [`ConfigError::InvalidSchema`] on unknown
    /// rules, unknown type names, ill-typed rule values or bad regexes.
    pub fn new(schema: &Schema) -> Result<Self, ConfigError> {
        Self::compile(schema, false)
    }

    /// Like [`new`](Self::new), but accepts top-level fields the schema does
    /// not mention.
    pub fn allowing_unknown(schema: &Schema) -> Result<Self, ConfigError> {
        Self::compile(schema, true)
    }

    fn compile(schema: &Schema, allow_unknown: bool) -> Result<Self, ConfigError> {
        let schema = Value::Object(translate_fields(schema, "", allow_unknown)?);
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| ConfigError::InvalidSchema(e.to_string()))?;
        tracing::debug!(allow_unknown, "compiled validation schema");
        Ok(Self { schema, compiled })
    }

    /// The JSON Schema the rules were translated into.
    pub fn json_schema(&self) -> &Value {
        &self.schema
    }

    /// Translated rules for the value at `path`.
    fn rules_at(&self, path: &[String]) -> Option<&Map<String, Value>> {
        path.iter()
            .try_fold(&self.schema, |rules, segment| {
                rules
                    .get("properties")
                    .and_then(|properties| properties.get(segment.as_str()))
                    .or_else(|| rules.get("items"))
            })
            .and_then(Value::as_object)
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, data: &Map<String, Value>) -> Result<(), ErrorReport> {
        let instance = Value::Object(data.clone());
        let mut report = ErrorReport::new();

        if let Err(errors) = self.compiled.validate(&instance) {
            for error in errors {
                let path = pointer_segments(&error.instance_path.to_string());
                match &error.kind {
                    ValidationErrorKind::AdditionalProperties { unexpected } => {
                        for name in unexpected {
                            report.push_at(&child(&path, name), "unknown field");
                        }
                    }
                    ValidationErrorKind::Required { property } => {
                        report.push_at(&child(&path, &plain(property)), "required field");
                    }
                    _ => report.push_at(&path, describe(&error, self.rules_at(&path))),
                }
            }
        }

        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }
}

fn describe(error: &jsonschema::ValidationError<'_>, rules: Option<&Map<String, Value>>) -> String {
    let rule = |key: &str| {
        rules
            .and_then(|rules| rules.get(key))
            .map(plain)
            .unwrap_or_default()
    };

    match &error.kind {
        ValidationErrorKind::Type { .. } | ValidationErrorKind::Not { .. }
            if error.instance.is_null() =>
        {
            "null value not allowed".to_string()
        }
        ValidationErrorKind::Type { .. } => {
            let names: Vec<&str> = rules
                .and_then(|rules| rules.get(TYPES_KEY))
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            format!("must be of {} type", names.join(" or "))
        }
        ValidationErrorKind::Not { .. } => "empty values not allowed".to_string(),
        ValidationErrorKind::Enum { .. } => format!("unallowed value {}", plain(&error.instance)),
        ValidationErrorKind::Minimum { .. } => format!("min value is {}", rule("minimum")),
        ValidationErrorKind::Maximum { .. } => format!("max value is {}", rule("maximum")),
        ValidationErrorKind::MinLength { .. }
        | ValidationErrorKind::MinItems { .. }
        | ValidationErrorKind::MinProperties { .. } => {
            format!("min length is {}", rule("minLength"))
        }
        ValidationErrorKind::MaxLength { .. }
        | ValidationErrorKind::MaxItems { .. }
        | ValidationErrorKind::MaxProperties { .. } => {
            format!("max length is {}", rule("maxLength"))
        }
        ValidationErrorKind::Pattern { .. } => {
            format!("value does not match regex '{}'", rule(REGEX_KEY))
        }
        _ => error.to_string(),
    }
}

/// Splits a JSON pointer such as `/db/replicas/0` into its segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn child(path: &[String], name: &str) -> Vec<String> {
    let mut path = path.to_vec();
    path.push(name.to_string());
    path
}

/// Strings without quotes, everything else in JSON form.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn invalid(path: &str, reason: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidSchema(format!("field '{path}': {reason}"))
}

/// Translates a field set into an object schema with `properties`,
/// `required` and `additionalProperties`.
fn translate_fields(
    schema: &Schema,
    prefix: &str,
    allow_unknown: bool,
) -> Result<Map<String, Value>, ConfigError> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (name, rules) in schema {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        let rules = rules
            .as_object()
            .ok_or_else(|| invalid(&path, "rules must be a mapping"))?;
        let (field, is_required) = translate_rules(rules, &path)?;
        if is_required {
            required.push(Value::String(name.clone()));
        }
        properties.insert(name.clone(), Value::Object(field));
    }

    let mut object = Map::new();
    object.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        object.insert("required".into(), Value::Array(required));
    }
    object.insert("additionalProperties".into(), Value::Bool(allow_unknown));
    Ok(object)
}

/// Translates one field's rules. Returns the field schema and whether the
/// field is required in its parent.
fn translate_rules(
    rules: &Map<String, Value>,
    path: &str,
) -> Result<(Map<String, Value>, bool), ConfigError> {
    let mut field = Map::new();
    let mut types = Vec::new();
    let mut required = false;
    let mut nullable = false;
    let mut empty = true;
    let mut allow_unknown = false;
    let mut allowed = None;
    let mut nested = None;

    for (rule, value) in rules {
        match rule.as_str() {
            "type" => types = parse_types(value, path)?,
            "required" => required = flag(rule, value, path)?,
            "nullable" => nullable = flag(rule, value, path)?,
            "empty" => empty = flag(rule, value, path)?,
            "allow_unknown" => allow_unknown = flag(rule, value, path)?,
            "allowed" => {
                let values = value
                    .as_array()
                    .ok_or_else(|| invalid(path, "'allowed' must be a list"))?;
                allowed = Some(values.clone());
            }
            "min" | "max" => {
                if !value.is_number() {
                    return Err(invalid(path, format!("'{rule}' must be a number")));
                }
                let keyword = if rule == "min" { "minimum" } else { "maximum" };
                field.insert(keyword.into(), value.clone());
            }
            "minlength" | "maxlength" => {
                let length = value.as_u64().ok_or_else(|| {
                    invalid(path, format!("'{rule}' must be a non-negative integer"))
                })?;
                let keywords = if rule == "minlength" {
                    ["minLength", "minItems", "minProperties"]
                } else {
                    ["maxLength", "maxItems", "maxProperties"]
                };
                for keyword in keywords {
                    field.insert(keyword.into(), Value::from(length));
                }
            }
            "regex" => {
                let source = value
                    .as_str()
                    .ok_or_else(|| invalid(path, "'regex' must be a string"))?;
                let anchored = format!("^(?:{source})$");
                Regex::new(&anchored).map_err(|e| invalid(path, format!("bad regex: {e}")))?;
                field.insert("pattern".into(), Value::String(anchored));
                field.insert(REGEX_KEY.into(), Value::String(source.to_string()));
            }
            "schema" => {
                nested = Some(
                    value
                        .as_object()
                        .ok_or_else(|| invalid(path, "'schema' must be a mapping"))?,
                );
            }
            "meta" => {}
            other => return Err(invalid(path, format!("unknown rule '{other}'"))),
        }
    }

    if !types.is_empty() {
        let mut json_types: Vec<Value> = Vec::new();
        for name in &types {
            let json_type = Value::from(json_type(name));
            if !json_types.contains(&json_type) {
                json_types.push(json_type);
            }
        }
        if nullable {
            json_types.push(Value::from("null"));
        }
        field.insert("type".into(), Value::Array(json_types));
        field.insert(TYPES_KEY.into(), Value::from(types.clone()));
    }

    let mut forbidden = Vec::new();
    if !nullable && types.is_empty() {
        forbidden.push(Value::Null);
    }
    if !empty {
        forbidden.extend([json!(""), json!([]), json!({})]);
    }
    if !forbidden.is_empty() {
        field.insert("not".into(), json!({ "enum": forbidden }));
    }

    // A list without dict in its types takes `schema` and `allowed` per item.
    let per_item = types.contains(&"list") && !types.contains(&"dict");
    if let Some(schema) = nested {
        if per_item {
            let (items, _) = translate_rules(schema, &format!("{path}[]"))?;
            field.insert("items".into(), Value::Object(items));
        } else {
            field.extend(translate_fields(schema, path, allow_unknown)?);
        }
    }

    if let Some(mut allowed) = allowed {
        if nullable {
            allowed.push(Value::Null);
        }
        if per_item {
            let items = field
                .entry("items")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(items) = items {
                items.insert("enum".into(), Value::Array(allowed));
            }
        } else {
            field.insert("enum".into(), Value::Array(allowed));
        }
    }

    Ok((field, required))
}

/// JSON Schema type for a Cerberus type name. `float` and `number` both
/// accept integers.
fn json_type(name: &str) -> &'static str {
    match name {
        "string" => "string",
        "integer" => "integer",
        "boolean" => "boolean",
        "dict" => "object",
        "list" => "array",
        _ => "number",
    }
}

fn parse_types(value: &Value, path: &str) -> Result<Vec<&'static str>, ConfigError> {
    const NAMES: &[&str] = &["string", "integer", "float", "number", "boolean", "dict", "list"];

    let names: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    names
        .into_iter()
        .map(|name| {
            let name = name
                .as_str()
                .ok_or_else(|| invalid(path, "'type' must be a string or a list of strings"))?;
            NAMES
                .iter()
                .find(|known| **known == name)
                .copied()
                .ok_or_else(|| invalid(path, format!("unknown type '{name}'")))
        })
        .collect()
}

fn flag(rule: &str, value: &Value, path: &str) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(path, format!("'{rule}' must be a boolean")))
}
