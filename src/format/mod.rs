//! Text decoders and the registry that resolves them by format name.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::ConfigError;

pub use builtin::JsonDecoder;
#[cfg(feature = "toml")]
pub use builtin::TomlDecoder;
#[cfg(feature = "yaml")]
pub use builtin::YamlDecoder;

/// Boxed error returned by decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Format the node falls back to when none is named.
pub const DEFAULT_FORMAT: &str = "json";

/// Formats this crate knows about but only ships behind a cargo feature.
/// Resolving one of these while its feature is off is a
/// [`ConfigError::MissingDependency`], not an unsupported format.
const OPTIONAL_FORMATS: &[(&str, &str, &str)] = &[
    ("toml", "toml decoder", "toml"),
    ("yaml", "yaml decoder", "yaml"),
    ("yml", "yaml decoder", "yaml"),
];

/// Parses format-specific text into a generic tree of maps, sequences and scalars.
pub trait Decoder: Send + Sync + fmt::Debug {
    /// Parses `text`. The result is usually, but not necessarily, an object.
    fn decode(&self, text: &str) -> Result<Value, BoxError>;
}

/// Maps format names to decoders.
///
/// [`DecoderRegistry::builtin`] (also the `Default`) holds `json` plus
/// whichever of `toml`, `yaml` and `yml` are compiled in. Custom formats can
/// be added with [`register`](Self::register) and handed to a node through
/// [`ConfigNodeBuilder::registry`](crate::ConfigNodeBuilder::registry).
#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    decoders: BTreeMap<String, Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// Creates a registry with no decoders at all.
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every decoder enabled at compile time.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("json", JsonDecoder);
        #[cfg(feature = "toml")]
        registry.register("toml", TomlDecoder);
        #[cfg(feature = "yaml")]
        {
            registry.register("yaml", YamlDecoder);
            registry.register("yml", YamlDecoder);
        }
        registry
    }

    /// Registers `decoder` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        decoder: impl Decoder + 'static,
    ) -> &mut Self {
        self.decoders.insert(name.into(), Arc::new(decoder));
        self
    }

    /// Looks up the decoder for `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Decoder>, ConfigError> {
        if let Some(decoder) = self.decoders.get(name) {
            tracing::debug!(format = name, "resolved config decoder");
            return Ok(Arc::clone(decoder));
        }

        match OPTIONAL_FORMATS.iter().find(|(format, _, _)| *format == name) {
            Some(&(_, what, feature)) => Err(ConfigError::MissingDependency { what, feature }),
            None => Err(ConfigError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Names of the registered formats, sorted.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
