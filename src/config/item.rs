use std::fmt;

use serde_json::Value;

use super::ConfigNode;

/// A value read out of a [`ConfigNode`].
///
/// Mappings come back as nodes and sequences as lists, so lookups can keep
/// chaining. Stepping through anything that is not there (an absent key, a
/// scalar, an index past the end) lands on an empty node rather than an
/// error:
///
/// ```
/// use confnode::ConfigNode;
/// use serde_json::json;
///
/// let node = ConfigNode::from_value(json!({
///     "foo": {"bar": "test"},
///     "cats": [{"name": "tom"}, {"name": "jerry"}]
/// }))?;
///
/// assert_eq!(node.get("foo").get("bar"), "test");
/// assert_eq!(node.get("cats").at(1).get("name"), "jerry");
/// assert!(node.get("a").get("b").get("c").is_missing());
/// # Ok::<(), confnode::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A mapping, or the empty node left by a failed lookup.
    Node(ConfigNode),
    /// A sequence; mapping elements are nodes, scalars stay values.
    List(Vec<Item>),
    /// A scalar, including `null`.
    Value(Value),
}

impl Item {
    /// The empty node that stands in for every failed lookup.
    ///
    /// It uses the built-in decoder registry and no schema, whichever node
    /// the lookup started from.
    pub fn missing() -> Self {
        Item::Node(ConfigNode::new())
    }

    /// Looks up `key` if this is a node; otherwise returns an empty node.
    pub fn get(&self, key: &str) -> Item {
        match self {
            Item::Node(node) => node.get(key),
            _ => Item::missing(),
        }
    }

    /// Returns element `index` if this is a list; otherwise an empty node.
    pub fn at(&self, index: usize) -> Item {
        match self {
            Item::List(items) => items.get(index).cloned().unwrap_or_else(Item::missing),
            _ => Item::missing(),
        }
    }

    /// One step of a dotted path: numeric segments index lists, anything
    /// else is a key.
    pub(crate) fn step(&self, segment: &str) -> Item {
        match (self, segment.parse::<usize>()) {
            (Item::List(_), Ok(index)) => self.at(index),
            _ => self.get(segment),
        }
    }

    /// True for an empty node, which is what every failed lookup yields.
    pub fn is_missing(&self) -> bool {
        matches!(self, Item::Node(node) if node.is_empty())
    }

    /// Negation of [`is_missing`](Self::is_missing).
    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    /// The node, if this item is one.
    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Consumes the item and returns the node, if it is one.
    pub fn into_node(self) -> Option<ConfigNode> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The elements, if this item is a list.
    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(items) => Some(items),
            _ => None,
        }
    }

    /// The scalar, if this item is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The string, if this item is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// The number as `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// The number as `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_value().and_then(Value::as_u64)
    }

    /// The number as `f64`, if this item is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// The boolean, if this item is one.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Rebuilds the plain tree this item was read from.
    pub fn to_value(&self) -> Value {
        match self {
            Item::Node(node) => Value::Object(node.as_map().clone()),
            Item::List(items) => Value::Array(items.iter().map(Item::to_value).collect()),
            Item::Value(value) => value.clone(),
        }
    }
}

impl PartialEq<Value> for Item {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Item::Node(node), other) => node == other,
            (Item::List(items), Value::Array(values)) => {
                items.len() == values.len()
                    && items.iter().zip(values).all(|(item, value)| item == value)
            }
            (Item::List(_), _) => false,
            (Item::Value(value), other) => value == other,
        }
    }
}

macro_rules! impl_scalar_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq<$ty> for Item {
                fn eq(&self, other: &$ty) -> bool {
                    matches!(self, Item::Value(value) if value == other)
                }
            }
        )*
    };
}

impl_scalar_eq![str, &str, String, bool, i32, i64, u64, f64];

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Node(node) => fmt::Display::fmt(node, f),
            Item::Value(Value::String(s)) => f.write_str(s),
            other => fmt::Display::fmt(&other.to_value(), f),
        }
    }
}
