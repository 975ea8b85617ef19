//! Transactions, changes, and apply reports.

use crate::DispatchError;
use unicli_model::{ConfigNode, Path};
use unicli_template::DiffPair;

/// The kind of transition a change represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// No previous state.
    Create,
    /// Both sides present.
    Update,
    /// No desired state.
    Delete,
}

impl ChangeKind {
    /// Returns the kind as a string, for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// One changed subtree within a transaction.
///
/// At least one side is always present; the constructors make a
/// both-absent change unrepresentable.
#[derive(Debug, Clone)]
pub struct Change {
    path: Path,
    before: Option<ConfigNode>,
    after: Option<ConfigNode>,
}

impl Change {
    /// A subtree being created.
    pub fn create(path: Path, after: ConfigNode) -> Self {
        Self {
            path,
            before: None,
            after: Some(after),
        }
    }

    /// A subtree transitioning between two states.
    pub fn modify(path: Path, before: ConfigNode, after: ConfigNode) -> Self {
        Self {
            path,
            before: Some(before),
            after: Some(after),
        }
    }

    /// A subtree being deleted.
    pub fn remove(path: Path, before: ConfigNode) -> Self {
        Self {
            path,
            before: Some(before),
            after: None,
        }
    }

    /// Returns the changed path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the previous state, if any.
    pub fn before(&self) -> Option<&ConfigNode> {
        self.before.as_ref()
    }

    /// Returns the desired state, if any.
    pub fn after(&self) -> Option<&ConfigNode> {
        self.after.as_ref()
    }

    /// Returns the transition kind.
    pub fn kind(&self) -> ChangeKind {
        match (&self.before, &self.after) {
            (None, Some(_)) => ChangeKind::Create,
            (Some(_), Some(_)) => ChangeKind::Update,
            (Some(_), None) => ChangeKind::Delete,
            (None, None) => unreachable!("constructors require at least one side"),
        }
    }

    /// Returns the transition as a template diff pair.
    pub fn to_diff_pair(&self) -> DiffPair {
        DiffPair::new(self.before.clone(), self.after.clone())
    }
}

/// The set of changed subtrees for one reconciliation.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    changes: Vec<Change>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a change, consuming the transaction.
    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// Adds a change in place.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Returns the changes in declaration order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns the number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if the transaction carries no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Outcome of one apply pass.
///
/// Partial application is a documented outcome: commands already issued
/// are never rolled back, so the report distinguishes what was applied,
/// what no handler accepted, and what was aborted after a failure or a
/// cancellation.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Transitions applied successfully, in invocation order.
    pub applied: Vec<(Path, ChangeKind)>,
    /// Changed paths no registration handled (no match, no writer, or
    /// every check declined).
    pub unhandled: Vec<Path>,
    /// Changed paths not attempted because the batch stopped early.
    pub aborted: Vec<Path>,
    /// True if a cancellation stopped the batch between registrations.
    pub cancelled: bool,
    /// The failure that stopped the batch, if any.
    pub failure: Option<DispatchError>,
}

impl ApplyReport {
    /// Returns true if the batch ran to completion without failure.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node() -> ConfigNode {
        ConfigNode::builder().field("mtu", 9100u64).build().unwrap()
    }

    #[test]
    fn test_change_kinds() {
        let path: Path = "/interfaces/interface[eth0]".parse().unwrap();
        assert_eq!(Change::create(path.clone(), node()).kind(), ChangeKind::Create);
        assert_eq!(
            Change::modify(path.clone(), node(), node()).kind(),
            ChangeKind::Update
        );
        assert_eq!(Change::remove(path, node()).kind(), ChangeKind::Delete);
    }

    #[test]
    fn test_diff_pair_sides_follow_kind() {
        let path: Path = "/interfaces/interface[eth0]".parse().unwrap();
        let pair = Change::create(path.clone(), node()).to_diff_pair();
        assert!(pair.before().is_none() && pair.after().is_some());

        let pair = Change::remove(path, node()).to_diff_pair();
        assert!(pair.before().is_some() && pair.after().is_none());
    }

    #[test]
    fn test_report_success() {
        let report = ApplyReport::default();
        assert!(report.is_success());

        let cancelled = ApplyReport {
            cancelled: true,
            ..Default::default()
        };
        assert!(!cancelled.is_success());
    }
}
