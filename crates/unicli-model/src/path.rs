//! Hierarchical configuration paths.

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a [`Path`]: a node type plus an optional list key.
///
/// A step without a key acts as a wildcard when the path is used as a
/// registration pattern: `interface` matches `interface[eth0]`,
/// `interface[eth1]`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathStep {
    node: String,
    key: Option<String>,
}

impl PathStep {
    /// Creates a step without a key.
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            key: None,
        }
    }

    /// Creates a step with a list key.
    pub fn keyed(node: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            key: Some(key.into()),
        }
    }

    /// Returns the node type.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Returns the list key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns true if this pattern step matches the given concrete step.
    ///
    /// Node types must be equal; a pattern step without a key matches any
    /// key on the concrete step.
    fn matches(&self, concrete: &PathStep) -> bool {
        if self.node != concrete.node {
            return false;
        }
        match &self.key {
            None => true,
            Some(key) => concrete.key.as_deref() == Some(key.as_str()),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]", self.node, key),
            None => write!(f, "{}", self.node),
        }
    }
}

/// An ordered sequence of steps identifying a location in the
/// configuration tree.
///
/// Paths are immutable and cheaply comparable. The textual form is
/// `/interfaces/interface[eth0]/config`; the root path renders as `/`.
///
/// # Examples
///
/// ```
/// use unicli_model::Path;
///
/// let path: Path = "/interfaces/interface[eth0]/config".parse().unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.key_of("interface"), Some("eth0"));
///
/// let parent = path.parent().unwrap();
/// assert!(path.is_under(&parent));
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// Returns the root path (no steps).
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a sequence of steps.
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Returns the steps of this path.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if this is the root path.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the last step, if any.
    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Returns a new path with `step` appended.
    pub fn join(&self, step: PathStep) -> Path {
        let mut steps = self.steps.clone();
        steps.push(step);
        Path { steps }
    }

    /// Returns a new path with an unkeyed child step appended.
    pub fn child(&self, node: impl Into<String>) -> Path {
        self.join(PathStep::new(node))
    }

    /// Returns a new path with a keyed child step appended.
    pub fn keyed_child(&self, node: impl Into<String>, key: impl Into<String>) -> Path {
        self.join(PathStep::keyed(node, key))
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Path {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Returns true if this path is equal to or below `ancestor`.
    ///
    /// Steps are compared exactly; keys must match.
    pub fn is_under(&self, ancestor: &Path) -> bool {
        self.steps.len() >= ancestor.steps.len()
            && self.steps[..ancestor.steps.len()] == ancestor.steps[..]
    }

    /// Truncates this path to the nearest ancestor-or-self step of the
    /// given node type, searching from the leaf upwards.
    ///
    /// Returns `None` if no step of that type exists.
    pub fn cut_to(&self, node_type: &str) -> Option<Path> {
        let pos = self.steps.iter().rposition(|s| s.node == node_type)?;
        Some(Path {
            steps: self.steps[..=pos].to_vec(),
        })
    }

    /// Returns the key of the nearest step of the given node type,
    /// searching from the leaf upwards.
    pub fn key_of(&self, node_type: &str) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.node == node_type)
            .and_then(|s| s.key())
    }

    /// Returns true if this concrete path matches `pattern` exactly.
    ///
    /// The lengths must be equal; pattern steps without keys match any
    /// key.
    pub fn matches(&self, pattern: &Path) -> bool {
        self.steps.len() == pattern.steps.len()
            && pattern
                .steps
                .iter()
                .zip(&self.steps)
                .all(|(p, c)| p.matches(c))
    }

    /// Returns true if `pattern` matches this path or one of its
    /// ancestors, i.e. this path lies inside the subtree the pattern
    /// denotes.
    pub fn matches_under(&self, pattern: &Path) -> bool {
        self.steps.len() >= pattern.steps.len()
            && pattern
                .steps
                .iter()
                .zip(&self.steps)
                .all(|(p, c)| p.matches(c))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "/" || s.is_empty() {
            return Ok(Path::root());
        }
        let trimmed = s
            .strip_prefix('/')
            .ok_or_else(|| ModelError::InvalidPath(s.to_string()))?;

        let mut steps = Vec::new();
        for part in trimmed.split('/') {
            if part.is_empty() {
                return Err(ModelError::InvalidPath(s.to_string()));
            }
            steps.push(parse_step(part).ok_or_else(|| ModelError::InvalidPath(s.to_string()))?);
        }
        Ok(Path { steps })
    }
}

fn parse_step(part: &str) -> Option<PathStep> {
    match part.find('[') {
        None => {
            if part.contains(']') {
                return None;
            }
            Some(PathStep::new(part))
        }
        Some(open) => {
            let node = &part[..open];
            let rest = &part[open + 1..];
            let key = rest.strip_suffix(']')?;
            if node.is_empty() || key.is_empty() || key.contains('[') {
                return None;
            }
            Some(PathStep::keyed(node, key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_display() {
        let path: Path = "/interfaces/interface[eth0]/config".parse().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "/interfaces/interface[eth0]/config");
        assert_eq!(path.steps()[1].node(), "interface");
        assert_eq!(path.steps()[1].key(), Some("eth0"));
    }

    #[test]
    fn test_parse_root() {
        let root: Path = "/".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("interfaces".parse::<Path>().is_err());
        assert!("/interfaces//config".parse::<Path>().is_err());
        assert!("/interface[".parse::<Path>().is_err());
        assert!("/interface[]".parse::<Path>().is_err());
        assert!("/interface]x".parse::<Path>().is_err());
    }

    #[test]
    fn test_is_under() {
        let parent: Path = "/interfaces/interface[eth0]".parse().unwrap();
        let child: Path = "/interfaces/interface[eth0]/config".parse().unwrap();
        let sibling: Path = "/interfaces/interface[eth1]".parse().unwrap();

        assert!(child.is_under(&parent));
        assert!(parent.is_under(&parent));
        assert!(!parent.is_under(&child));
        assert!(!sibling.is_under(&parent));
    }

    #[test]
    fn test_cut_to() {
        let path: Path = "/interfaces/interface[eth0]/subinterfaces/subinterface[0]"
            .parse()
            .unwrap();

        let iface = path.cut_to("interface").unwrap();
        assert_eq!(iface.to_string(), "/interfaces/interface[eth0]");

        let sub = path.cut_to("subinterface").unwrap();
        assert_eq!(sub, path);

        assert!(path.cut_to("vlan").is_none());
    }

    #[test]
    fn test_key_of() {
        let path: Path = "/vlans/vlan[100]/members/member[eth0]".parse().unwrap();
        assert_eq!(path.key_of("vlan"), Some("100"));
        assert_eq!(path.key_of("member"), Some("eth0"));
        assert_eq!(path.key_of("members"), None);
    }

    #[test]
    fn test_pattern_matching() {
        let pattern: Path = "/interfaces/interface".parse().unwrap();
        let concrete: Path = "/interfaces/interface[eth0]".parse().unwrap();
        let deeper: Path = "/interfaces/interface[eth0]/config".parse().unwrap();

        assert!(concrete.matches(&pattern));
        assert!(!deeper.matches(&pattern));
        assert!(deeper.matches_under(&pattern));
        assert!(concrete.matches_under(&pattern));

        let keyed_pattern: Path = "/interfaces/interface[eth1]".parse().unwrap();
        assert!(!concrete.matches(&keyed_pattern));
    }

    #[test]
    fn test_join_and_parent() {
        let path = Path::root()
            .child("interfaces")
            .keyed_child("interface", "eth0");
        assert_eq!(path.to_string(), "/interfaces/interface[eth0]");

        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/interfaces");
        assert!(Path::root().parent().is_none());
    }

    #[test]
    fn test_ordering_is_stable() {
        let a: Path = "/interfaces/interface[eth0]".parse().unwrap();
        let b: Path = "/interfaces/interface[eth1]".parse().unwrap();
        assert!(a < b);
    }
}
