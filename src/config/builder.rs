use std::sync::Arc;

use serde_json::{Map, Value};

use super::node::builtin_registry;
use super::{ConfigError, ConfigNode};
use crate::format::{DecoderRegistry, DEFAULT_FORMAT};
use crate::validation::{Schema, Validator};

/// Builder for a [`ConfigNode`] with a format, schema or initial data.
///
/// The format is resolved when [`build`](Self::build) runs, so an unknown
/// name or a format whose cargo feature is disabled fails right away rather
/// than at the first load.
///
/// ## Example
///
/// ```
/// use confnode::ConfigNode;
/// use serde_json::json;
///
/// let schema = json!({
///     "foo": {"type": "integer"},
///     "some_field": {"type": "string"}
/// });
///
/// let mut node = ConfigNode::builder()
///     .format("json")
///     .schema(schema.as_object().cloned().unwrap_or_default())
///     .build()?;
///
/// let err = node
///     .load_from_string(r#"{"foo": "bar", "arr": []}"#, None)
///     .unwrap_err();
/// let message = err.as_validation().map(|e| e.message()).unwrap_or_default();
/// assert!(message.contains("foo: must be of integer type\n"));
/// assert!(message.contains("arr: unknown field\n"));
/// # Ok::<(), confnode::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigNodeBuilder {
    format: Option<String>,
    schema: Option<Schema>,
    data: Map<String, Value>,
    registry: Option<Arc<DecoderRegistry>>,
    validator: Option<Arc<dyn Validator>>,
}

impl ConfigNodeBuilder {
    /// Sets the format used by loads that do not name one. Defaults to `json`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the schema that every [`load`](ConfigNode::load) is checked against.
    ///
    /// An empty schema disables validation.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the initial data. Initial data is not validated.
    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Replaces the built-in decoder registry.
    pub fn registry(mut self, registry: impl Into<Arc<DecoderRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Uses `validator` instead of building one from the schema.
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Resolves the format and builds the node.
    pub fn build(self) -> Result<ConfigNode, ConfigError> {
        let registry = self.registry.unwrap_or_else(builtin_registry);
        let format = self.format.unwrap_or_else(|| DEFAULT_FORMAT.to_string());
        let decoder = registry.resolve(&format)?;

        Ok(ConfigNode::from_parts(
            self.data,
            format,
            decoder,
            registry,
            self.schema,
            self.validator,
        ))
    }
}
