//! Binding values handed to the renderer.

use unicli_model::{ConfigNode, Value};

/// A before/after pair of subtree snapshots for the `update()` macro.
///
/// Either side may be absent: no `before` means create, no `after`
/// means delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffPair {
    before: Option<ConfigNode>,
    after: Option<ConfigNode>,
}

impl DiffPair {
    /// Creates a pair from optional sides.
    pub fn new(before: Option<ConfigNode>, after: Option<ConfigNode>) -> Self {
        Self { before, after }
    }

    /// A create transition: no previous state.
    pub fn create(after: ConfigNode) -> Self {
        Self::new(None, Some(after))
    }

    /// An update transition.
    pub fn modify(before: ConfigNode, after: ConfigNode) -> Self {
        Self::new(Some(before), Some(after))
    }

    /// A delete transition: no desired state.
    pub fn remove(before: ConfigNode) -> Self {
        Self::new(Some(before), None)
    }

    /// Returns the previous state, if any.
    pub fn before(&self) -> Option<&ConfigNode> {
        self.before.as_ref()
    }

    /// Returns the desired state, if any.
    pub fn after(&self) -> Option<&ConfigNode> {
        self.after.as_ref()
    }
}

/// A value bound to a template variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    /// A scalar leaf, rendered via its CLI textual form.
    Scalar(Value),
    /// A field-addressable subtree.
    Node(ConfigNode),
    /// An ordered sequence for `loop`.
    List(Vec<TemplateValue>),
    /// A before/after pair for `update()`.
    Diff(DiffPair),
}

impl From<Value> for TemplateValue {
    fn from(v: Value) -> Self {
        TemplateValue::Scalar(v)
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Scalar(Value::from(s))
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Scalar(Value::from(s))
    }
}

impl From<u64> for TemplateValue {
    fn from(u: u64) -> Self {
        TemplateValue::Scalar(Value::from(u))
    }
}

impl From<i64> for TemplateValue {
    fn from(i: i64) -> Self {
        TemplateValue::Scalar(Value::from(i))
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Scalar(Value::from(b))
    }
}

impl From<ConfigNode> for TemplateValue {
    fn from(n: ConfigNode) -> Self {
        TemplateValue::Node(n)
    }
}

impl From<Vec<ConfigNode>> for TemplateValue {
    fn from(nodes: Vec<ConfigNode>) -> Self {
        TemplateValue::List(nodes.into_iter().map(TemplateValue::Node).collect())
    }
}

impl From<Vec<TemplateValue>> for TemplateValue {
    fn from(values: Vec<TemplateValue>) -> Self {
        TemplateValue::List(values)
    }
}

impl From<DiffPair> for TemplateValue {
    fn from(pair: DiffPair) -> Self {
        TemplateValue::Diff(pair)
    }
}

/// Named values for one render pass.
///
/// # Example
///
/// ```
/// use unicli_template::Bindings;
///
/// let bindings = Bindings::new().bind("name", "eth0").bind("mtu", 9100u64);
/// assert!(bindings.get("name").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: Vec<(String, TemplateValue)>,
}

impl Bindings {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, consuming the set. A rebind of the same name
    /// shadows the earlier value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds a binding in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<TemplateValue>) {
        self.values.push((name.into(), value.into()));
    }

    /// Looks up a binding; the most recent bind of a name wins.
    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rebind_shadows() {
        let bindings = Bindings::new().bind("x", 1u64).bind("x", 2u64);
        assert_eq!(bindings.get("x"), Some(&TemplateValue::from(2u64)));
    }

    #[test]
    fn test_diff_pair_sides() {
        let node = ConfigNode::builder().field("mtu", 1500u64).build().unwrap();
        assert!(DiffPair::create(node.clone()).before().is_none());
        assert!(DiffPair::remove(node.clone()).after().is_none());
        let pair = DiffPair::modify(node.clone(), node);
        assert!(pair.before().is_some() && pair.after().is_some());
    }

    #[test]
    fn test_list_from_nodes() {
        let nodes = vec![ConfigNode::empty(), ConfigNode::empty()];
        match TemplateValue::from(nodes) {
            TemplateValue::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected value: {other:?}"),
        }
    }
}
