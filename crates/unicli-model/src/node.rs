//! Immutable configuration tree snapshots.

use crate::{ModelError, Path};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar leaf value.
///
/// `Display` renders the CLI textual form; typed accessors return
/// `Option` and never coerce between kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

impl Value {
    /// Returns the string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the signed integer content, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the unsigned integer content, if this is an unsigned value.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<u16> for Value {
    fn from(u: u16) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// An immutable, recursively-structured subtree snapshot.
///
/// A node holds scalar fields and keyed child nodes, both preserving
/// insertion order. Two snapshots of the same [`Path`] — `before` and
/// `after` — represent a transition; either may be absent (create /
/// delete). Equality is structural.
///
/// Nodes are constructed through [`ConfigNode::builder`]; duplicate field
/// or child keys are a builder error, never silently overwritten.
///
/// # Examples
///
/// ```
/// use unicli_model::ConfigNode;
///
/// let config = ConfigNode::builder()
///     .field("mtu", 9100u64)
///     .field("enabled", true)
///     .build()
///     .unwrap();
/// let iface = ConfigNode::builder()
///     .field("name", "eth0")
///     .child("config", config)
///     .build()
///     .unwrap();
///
/// assert_eq!(iface.lookup("config.mtu").and_then(|v| v.as_uint()), Some(9100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    fields: Vec<(String, Value)>,
    children: Vec<(String, ConfigNode)>,
}

impl ConfigNode {
    /// Returns a new staged builder.
    pub fn builder() -> ConfigNodeBuilder {
        ConfigNodeBuilder::default()
    }

    /// Returns an empty node.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the node has no fields and no children.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.is_empty()
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    /// Returns a string field, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns an unsigned field, if present and unsigned.
    pub fn get_uint(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(Value::as_uint)
    }

    /// Returns a boolean field, if present and boolean.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Returns true if the field exists.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(f, _)| f == field)
    }

    /// Iterates fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v))
    }

    /// Returns the child with the given key, if present.
    pub fn child(&self, key: &str) -> Option<&ConfigNode> {
        self.children
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    /// Iterates children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.children.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Resolves a dotted reference like `config.mtu`.
    ///
    /// All segments but the last traverse children; the last segment
    /// names a field. A single segment reads a field on this node.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        let mut node = self;
        let mut segments = dotted.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return node.get(segment);
            }
            node = node.child(segment)?;
        }
        None
    }

    /// Returns the subtree at a path relative to this node, if present.
    ///
    /// Child identities are the `Display` form of each path step
    /// (`interface[eth0]`).
    pub fn subtree(&self, rel: &Path) -> Option<&ConfigNode> {
        let mut node = self;
        for step in rel.steps() {
            node = node.child(&step.to_string())?;
        }
        Some(node)
    }

    /// Returns a copy of this tree with `sub` grafted at `rel`,
    /// creating empty intermediate nodes as needed. An existing subtree
    /// at that location is replaced.
    pub fn with_subtree(&self, rel: &Path, sub: ConfigNode) -> ConfigNode {
        if rel.is_root() {
            return sub;
        }
        let key = rel.steps()[0].to_string();
        let rest = Path::new(rel.steps()[1..].to_vec());

        let mut out = self.clone();
        match out.children.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                *existing = existing.with_subtree(&rest, sub);
            }
            None => {
                out.children
                    .push((key, ConfigNode::empty().with_subtree(&rest, sub)));
            }
        }
        out
    }
}

/// Staged builder for [`ConfigNode`].
///
/// Offers both a consuming chain (`field`, `child`) for literal
/// construction and non-consuming setters (`set_field`, `set_child`) for
/// incremental population by readers. Duplicate keys are recorded and
/// surfaced by [`ConfigNodeBuilder::build`].
#[derive(Debug, Default)]
pub struct ConfigNodeBuilder {
    fields: Vec<(String, Value)>,
    children: Vec<(String, ConfigNode)>,
    error: Option<ModelError>,
}

impl ConfigNodeBuilder {
    /// Adds a scalar field, consuming the builder.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Adds a child node, consuming the builder.
    pub fn child(mut self, key: impl Into<String>, node: ConfigNode) -> Self {
        self.set_child(key, node);
        self
    }

    /// Adds a scalar field in place.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if self.error.is_none() && self.fields.iter().any(|(f, _)| *f == name) {
            self.error = Some(ModelError::DuplicateField(name));
            return;
        }
        self.fields.push((name, value.into()));
    }

    /// Adds a child node in place.
    pub fn set_child(&mut self, key: impl Into<String>, node: ConfigNode) {
        let key = key.into();
        if self.error.is_none() && self.children.iter().any(|(k, _)| *k == key) {
            self.error = Some(ModelError::DuplicateChild(key));
            return;
        }
        self.children.push((key, node));
    }

    /// Returns true if nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.is_empty()
    }

    /// Finalizes the node.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate field/child error recorded during
    /// staging.
    pub fn build(self) -> Result<ConfigNode, ModelError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(ConfigNode {
            fields: self.fields,
            children: self.children,
        })
    }
}
