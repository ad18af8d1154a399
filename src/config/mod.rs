//! The configuration node and its loading pipeline.

mod builder;
mod error;
mod file;
mod item;
mod node;

pub use builder::ConfigNodeBuilder;
pub use error::ConfigError;
pub use item::Item;
pub use node::ConfigNode;
