use serde_json::Value;

use super::{BoxError, Decoder};

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, text: &str) -> Result<Value, BoxError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// TOML via the `toml` crate.
///
/// Datetimes become their RFC 3339 string form. Non-finite floats, which the
/// JSON tree cannot hold as numbers, become strings such as `"inf"`.
#[cfg(feature = "toml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDecoder;

#[cfg(feature = "toml")]
impl Decoder for TomlDecoder {
    fn decode(&self, text: &str) -> Result<Value, BoxError> {
        let table: toml::Table = toml::from_str(text)?;
        Ok(toml_to_tree(toml::Value::Table(table)))
    }
}

#[cfg(feature = "toml")]
fn toml_to_tree(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => float_to_tree(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_tree).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_tree(value)))
                .collect(),
        ),
    }
}

/// Non-finite floats have no JSON number form and become `"NaN"`, `"inf"`
/// or `"-inf"`.
#[cfg(any(feature = "toml", feature = "yaml"))]
fn float_to_tree(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(f.to_string()))
}

/// YAML via `serde_yaml`. An empty document decodes to an empty mapping.
///
/// Scalars follow the TOML decoder: non-finite floats become strings. Tags
/// are dropped, and mapping keys must be strings.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

#[cfg(feature = "yaml")]
impl Decoder for YamlDecoder {
    fn decode(&self, text: &str) -> Result<Value, BoxError> {
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        yaml_to_tree(serde_yaml::from_str(text)?)
    }
}

#[cfg(feature = "yaml")]
fn yaml_to_tree(value: serde_yaml::Value) -> Result<Value, BoxError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(float_to_tree).unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_tree)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| Ok((yaml_key(key)?, yaml_to_tree(value)?)))
                .collect::<Result<_, BoxError>>()?,
        ),
        Yaml::Tagged(tagged) => yaml_to_tree(tagged.value)?,
    })
}

#[cfg(feature = "yaml")]
fn yaml_key(key: serde_yaml::Value) -> Result<String, BoxError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        other => {
            let shown = yaml_to_tree(other)?;
            Err(format!("mapping key {shown} is not a string").into())
        }
    }
}
