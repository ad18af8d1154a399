use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::builder::ConfigNodeBuilder;
use super::file::read_config_file;
use super::{ConfigError, Item};
use crate::format::{BoxError, Decoder, DecoderRegistry, JsonDecoder, DEFAULT_FORMAT};
use crate::validation::{Schema, ValidationError, Validator};

/// A configuration tree with forgiving path access.
///
/// The node owns a string-keyed map. Reads go through [`get`](Self::get),
/// which copies nested mappings and sequences out as new [`Item`]s; an
/// absent key yields an empty node instead of an error, so arbitrarily deep
/// lookups can be chained and checked once at the end.
///
/// Loading decodes text with the node's format, runs the configured
/// validator (if any) and then shallow-merges the result: top-level keys are
/// added or replaced, nested mappings are not merged.
///
/// `ConfigNode` is `Send + Sync` but has no internal locking. Mutation takes
/// `&mut self`; share one behind a `Mutex` or `RwLock` if several threads
/// need to write.
///
/// ## Example
///
/// ```
/// use confnode::ConfigNode;
///
/// let mut node = ConfigNode::new();
/// node.load_from_string(r#"{"server": {"port": 8080}}"#, None)?;
///
/// assert_eq!(node.get("server").get("port"), 8080);
/// assert!(node.get("server").get("tls").get("cert").is_missing());
/// # Ok::<(), confnode::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigNode {
    data: Map<String, Value>,
    format: String,
    decoder: Arc<dyn Decoder>,
    registry: Arc<DecoderRegistry>,
    schema: Option<Schema>,
    validator: Option<Arc<dyn Validator>>,
}

pub(super) fn builtin_registry() -> Arc<DecoderRegistry> {
    static BUILTIN: OnceLock<Arc<DecoderRegistry>> = OnceLock::new();
    Arc::clone(BUILTIN.get_or_init(|| Arc::new(DecoderRegistry::builtin())))
}

impl ConfigNode {
    /// Creates an empty node that decodes JSON and does no validation.
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Creates a builder for a node with a format, schema or initial data.
    pub fn builder() -> ConfigNodeBuilder {
        ConfigNodeBuilder::default()
    }

    /// Wraps `data` in a JSON node without validation.
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self::with_registry(data, builtin_registry())
    }

    /// Wraps a JSON object. Any other kind of value is rejected with
    /// [`ConfigError::NotAMapping`].
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        into_mapping(value).map(Self::from_map)
    }

    fn with_registry(data: Map<String, Value>, registry: Arc<DecoderRegistry>) -> Self {
        Self {
            data,
            format: DEFAULT_FORMAT.to_string(),
            decoder: Arc::new(JsonDecoder),
            registry,
            schema: None,
            validator: None,
        }
    }

    pub(super) fn from_parts(
        data: Map<String, Value>,
        format: String,
        decoder: Arc<dyn Decoder>,
        registry: Arc<DecoderRegistry>,
        schema: Option<Schema>,
        validator: Option<Arc<dyn Validator>>,
    ) -> Self {
        Self {
            data,
            format,
            decoder,
            registry,
            schema,
            validator,
        }
    }

    /// A detached child view: same registry, no schema, no link back.
    fn view(&self, data: Map<String, Value>) -> Self {
        Self::with_registry(data, Arc::clone(&self.registry))
    }

    /// Name of the format used when a load does not name one.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Schema checked on every [`load`](Self::load), if one was set.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Reads `path` and loads it with [`load_from_string`](Self::load_from_string).
    ///
    /// Decode errors carry the file path.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        format: Option<&str>,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = read_config_file(path)?;
        self.load_from_string(&text, format).map_err(|e| e.with_path(path))
    }

    /// Decodes `text` and loads the result.
    ///
    /// A `format` given here is resolved before anything is decoded and
    /// replaces the node's format for later loads as well. The decoded text
    /// must be a mapping at the top level.
    pub fn load_from_string(
        &mut self,
        text: &str,
        format: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(format) = format {
            self.decoder = self.registry.resolve(format)?;
            self.format = format.to_string();
        }

        let decode_error = |source: BoxError| ConfigError::Decode {
            format: self.format.clone(),
            path: None,
            source,
        };
        let tree = self.decoder.decode(text).map_err(decode_error)?;
        let tree = into_mapping(tree).map_err(|e| decode_error(e.to_string().into()))?;

        self.load(tree)
    }

    /// Validates `tree` when validation is configured, then merges it.
    ///
    /// Validation failures leave the node untouched.
    pub fn load(&mut self, tree: Map<String, Value>) -> Result<(), ConfigError> {
        if self.validates() {
            self.validate(&tree)?;
        }
        tracing::debug!(keys = tree.len(), format = %self.format, "merging config");
        self.update(tree);
        Ok(())
    }

    fn validates(&self) -> bool {
        self.validator.is_some() || self.schema.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Checks `tree` with the injected validator, or with a
    /// [`SchemaValidator`](crate::validation::SchemaValidator) built from the
    /// node's schema. With neither configured every tree passes.
    pub fn validate(&self, tree: &Map<String, Value>) -> Result<(), ConfigError> {
        let outcome = match (&self.validator, &self.schema) {
            (Some(validator), _) => validator.validate(tree),
            (None, Some(schema)) => schema_validator(schema)?.validate(tree),
            (None, None) => return Ok(()),
        };

        outcome.map_err(|report| {
            tracing::debug!(fields = report.len(), "config rejected by validator");
            ValidationError::new(report).into()
        })
    }

    /// Merges `tree` into the node, replacing existing top-level keys.
    /// Never validates.
    pub fn update(&mut self, tree: Map<String, Value>) {
        self.data.extend(tree);
    }

    /// Sets a single top-level key. Never validates.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let mut tree = Map::new();
        tree.insert(key.into(), value.into());
        self.update(tree);
    }

    /// Reads `key`. Mappings become nodes, sequences become lists and
    /// scalars are returned as values; an absent key gives
    /// [`Item::missing`].
    pub fn get(&self, key: &str) -> Item {
        match self.data.get(key) {
            Some(value) => self.wrap(value),
            None => Item::missing(),
        }
    }

    /// Follows a dotted path such as `"db.replicas.0.host"`. Numeric
    /// segments index into lists. Never fails; see [`get`](Self::get).
    pub fn get_path(&self, path: &str) -> Item {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        segments.fold(self.get(first), |item, segment| item.step(segment))
    }

    fn wrap(&self, value: &Value) -> Item {
        match value {
            Value::Object(map) => Item::Node(self.view(map.clone())),
            Value::Array(items) => Item::List(items.iter().map(|item| self.wrap(item)).collect()),
            scalar => Item::Value(scalar.clone()),
        }
    }

    /// The whole underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Consumes the node and returns its map.
    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the node holds no keys, as every failed lookup does.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Negation of [`is_empty`](Self::is_empty).
    pub fn is_present(&self) -> bool {
        !self.data.is_empty()
    }

    /// Compares the node with an optional value.
    ///
    /// `None` and `Value::Null` match an empty node. Anything else matches
    /// only an object equal to the node's map, so a node never equals a bare
    /// scalar.
    pub fn eq_value(&self, other: Option<&Value>) -> bool {
        match other {
            None | Some(Value::Null) => self.data.is_empty(),
            Some(Value::Object(map)) => *map == self.data,
            Some(_) => false,
        }
    }

    /// Deserializes the whole tree into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

#[cfg(feature = "validation")]
fn schema_validator(schema: &Schema) -> Result<Box<dyn Validator>, ConfigError> {
    Ok(Box::new(crate::validation::SchemaValidator::new(schema)?))
}

#[cfg(not(feature = "validation"))]
fn schema_validator(_schema: &Schema) -> Result<Box<dyn Validator>, ConfigError> {
    Err(ConfigError::MissingDependency {
        what: "schema validator",
        feature: "validation",
    })
}

fn into_mapping(value: Value) -> Result<Map<String, Value>, ConfigError> {
    let found = match value {
        Value::Object(map) => return Ok(map),
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
    };
    Err(ConfigError::NotAMapping { found })
}

impl Default for ConfigNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for ConfigNode {
    fn from(data: Map<String, Value>) -> Self {
        Self::from_map(data)
    }
}

impl PartialEq for ConfigNode {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl PartialEq<Value> for ConfigNode {
    fn eq(&self, other: &Value) -> bool {
        self.eq_value(Some(other))
    }
}

impl PartialEq<Map<String, Value>> for ConfigNode {
    fn eq(&self, other: &Map<String, Value>) -> bool {
        self.data == *other
    }
}

/// `None` when empty, otherwise the compact JSON form of the map.
impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            return f.write_str("None");
        }
        let json = serde_json::to_string(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
