//! Lightweight configuration container.
//!
//! A [`ConfigNode`] loads JSON, TOML or YAML text into an ordered map,
//! optionally checks it against a Cerberus-style schema, and hands values
//! back through lookups that never fail: an absent key is an empty node, so
//! `node.get("a").get("b").get("c").is_missing()` is a safe existence check.
//!
//! ## Cargo features
//!
//! - `toml` (default): the `toml` format.
//! - `yaml` (default): the `yaml` and `yml` formats.
//! - `validation` (default): [`SchemaValidator`](validation::SchemaValidator),
//!   used for nodes built with a schema. Rules are checked by the
//!   `jsonschema` crate.
//!
//! Naming a format or using a schema whose feature is off fails with
//! [`ConfigError::MissingDependency`].

pub mod config;
pub mod format;
pub mod validation;

pub use config::{ConfigError, ConfigNode, ConfigNodeBuilder, Item};
pub use format::{Decoder, DecoderRegistry};
pub use validation::{ErrorEntry, ErrorReport, Schema, ValidationError, Validator};
