//! Handler registration and the build-once registry.

use crate::{Check, Reader, RegistryError, Writer};
use std::sync::Arc;
use unicli_model::{ConfigNode, Path};

/// Binds a path pattern to handler capabilities and ordering edges.
///
/// The pattern's unkeyed steps act as wildcards, so one registration
/// covers every list entry of its subtree. `run_after`/`run_before`
/// edges reference other registrations by their pattern; subtree
/// inclusions extend coverage below other patterns and exclusions
/// strictly remove matched paths from the included subtree.
///
/// # Example
///
/// ```
/// use unicli_dispatch::HandlerRegistration;
/// use unicli_model::Path;
///
/// let iface: Path = "/interfaces/interface".parse().unwrap();
/// let vlan: Path = "/vlans/vlan".parse().unwrap();
///
/// let registration = HandlerRegistration::new(vlan)
///     .run_after(iface);
/// assert_eq!(registration.pattern().to_string(), "/vlans/vlan");
/// ```
pub struct HandlerRegistration {
    pattern: Path,
    reader: Option<Arc<dyn Reader>>,
    writer: Option<Arc<dyn Writer>>,
    check: Option<Arc<dyn Check>>,
    after: Vec<Path>,
    before: Vec<Path>,
    subtree_handles: Vec<Path>,
    subtree_excludes: Vec<Path>,
}

impl HandlerRegistration {
    /// Creates a registration for a path pattern.
    pub fn new(pattern: Path) -> Self {
        Self {
            pattern,
            reader: None,
            writer: None,
            check: None,
            after: Vec::new(),
            before: Vec::new(),
            subtree_handles: Vec::new(),
            subtree_excludes: Vec::new(),
        }
    }

    /// Attaches the reader capability.
    pub fn with_reader(mut self, reader: Arc<dyn Reader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Attaches the writer capability.
    pub fn with_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Attaches the applicability check.
    pub fn with_check(mut self, check: Arc<dyn Check>) -> Self {
        self.check = Some(check);
        self
    }

    /// Attaches a closure as the applicability check.
    pub fn check_fn<F>(self, check: F) -> Self
    where
        F: Fn(&Path, Option<&ConfigNode>, Option<&ConfigNode>) -> bool + Send + Sync + 'static,
    {
        self.with_check(Arc::new(check))
    }

    /// Declares that this registration runs after the one at `pattern`.
    pub fn run_after(mut self, pattern: Path) -> Self {
        self.after.push(pattern);
        self
    }

    /// Declares that this registration runs before the one at `pattern`.
    pub fn run_before(mut self, pattern: Path) -> Self {
        self.before.push(pattern);
        self
    }

    /// Extends coverage to every path under `pattern`.
    pub fn handles_subtree(mut self, pattern: Path) -> Self {
        self.subtree_handles.push(pattern);
        self
    }

    /// Removes every path under `pattern` from this registration's
    /// coverage.
    pub fn excludes_subtree(mut self, pattern: Path) -> Self {
        self.subtree_excludes.push(pattern);
        self
    }

    /// Returns the primary pattern.
    pub fn pattern(&self) -> &Path {
        &self.pattern
    }

    pub(crate) fn reader(&self) -> Option<&Arc<dyn Reader>> {
        self.reader.as_ref()
    }

    pub(crate) fn writer(&self) -> Option<&Arc<dyn Writer>> {
        self.writer.as_ref()
    }

    /// Evaluates the applicability check; a registration without one
    /// always applies.
    pub(crate) fn applies(
        &self,
        path: &Path,
        before: Option<&ConfigNode>,
        after: Option<&ConfigNode>,
    ) -> bool {
        self.check
            .as_ref()
            .map_or(true, |c| c.applies(path, before, after))
    }

    /// Returns true if this registration covers `path`.
    ///
    /// Exclusions win over both the primary pattern and subtree
    /// inclusions.
    pub(crate) fn handles(&self, path: &Path) -> bool {
        if self.subtree_excludes.iter().any(|e| path.matches_under(e)) {
            return false;
        }
        path.matches(&self.pattern) || self.subtree_handles.iter().any(|s| path.matches_under(s))
    }
}

impl std::fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("pattern", &self.pattern.to_string())
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .field("check", &self.check.is_some())
            .field("after", &self.after)
            .field("before", &self.before)
            .finish()
    }
}

/// Explicit registry builder, constructed once at process start.
///
/// There is no module-level mutable state: the built [`Registry`] is
/// passed by reference into the dispatcher.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registrations: Vec<HandlerRegistration>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration, consuming the builder.
    pub fn register(mut self, registration: HandlerRegistration) -> Self {
        self.add(registration);
        self
    }

    /// Adds a registration in place.
    pub fn add(&mut self, registration: HandlerRegistration) {
        self.registrations.push(registration);
    }

    /// Validates the edge graph and freezes the registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownReference`] if an edge names a pattern no
    /// registration carries, and [`RegistryError::DependencyCycle`] if
    /// the edges do not form a DAG. Both are configuration errors
    /// detected here, not at transaction time.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let registrations = self.registrations;

        // deps[i] holds every index that must run before i.
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); registrations.len()];
        for (i, registration) in registrations.iter().enumerate() {
            for reference in &registration.after {
                for j in resolve_reference(&registrations, i, reference)? {
                    deps[i].push(j);
                }
            }
            for reference in &registration.before {
                for j in resolve_reference(&registrations, i, reference)? {
                    deps[j].push(i);
                }
            }
        }

        detect_cycle(&registrations, &deps)?;
        Ok(Registry {
            registrations,
            deps,
        })
    }
}

/// Resolves an edge reference to every other registration with that
/// exact pattern.
fn resolve_reference(
    registrations: &[HandlerRegistration],
    from: usize,
    reference: &Path,
) -> Result<Vec<usize>, RegistryError> {
    let targets: Vec<usize> = registrations
        .iter()
        .enumerate()
        .filter(|(j, r)| *j != from && r.pattern == *reference)
        .map(|(j, _)| j)
        .collect();
    if targets.is_empty() {
        return Err(RegistryError::UnknownReference {
            registration: registrations[from].pattern.to_string(),
            reference: reference.to_string(),
        });
    }
    Ok(targets)
}

fn detect_cycle(
    registrations: &[HandlerRegistration],
    deps: &[Vec<usize>],
) -> Result<(), RegistryError> {
    let mut remaining: Vec<usize> = (0..registrations.len()).collect();
    loop {
        let snapshot = remaining.clone();
        remaining.retain(|&i| deps[i].iter().any(|d| snapshot.contains(d)));
        if remaining.is_empty() {
            return Ok(());
        }
        if remaining.len() == snapshot.len() {
            let cycle = remaining
                .iter()
                .map(|&i| registrations[i].pattern.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(RegistryError::DependencyCycle { cycle });
        }
    }
}

/// The frozen set of registrations for one device model.
///
/// Read-only after build; safe to share across transactions without
/// locking.
#[derive(Debug)]
pub struct Registry {
    registrations: Vec<HandlerRegistration>,
    deps: Vec<Vec<usize>>,
}

impl Registry {
    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> &HandlerRegistration {
        &self.registrations[index]
    }

    /// Returns the indices of registrations covering `path`, in
    /// declaration order.
    pub(crate) fn matching(&self, path: &Path) -> Vec<usize> {
        self.registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.handles(path))
            .map(|(i, _)| i)
            .collect()
    }

    /// Topologically sorts a set of registration indices by the declared
    /// edges, optionally adding extra dependency pairs.
    ///
    /// Ties preserve declaration order, so the result is stable across
    /// repeated runs with the same input set. `extra` pairs that would
    /// create a cycle with the declared edges are dropped rather than
    /// deadlocking the sort.
    pub(crate) fn order(&self, indices: &[usize], extra: &[(usize, usize)]) -> Vec<usize> {
        let mut pending: Vec<usize> = indices.to_vec();
        let mut done: Vec<usize> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let next = pending.iter().position(|&i| {
                let blocked_by_decl = self.deps[i].iter().any(|d| pending.contains(d));
                let blocked_by_extra = extra
                    .iter()
                    .any(|&(dep, node)| node == i && pending.contains(&dep));
                !blocked_by_decl && !blocked_by_extra
            });
            match next {
                Some(pos) => done.push(pending.remove(pos)),
                // Every pending node is blocked; the extra edges formed a
                // cycle with the declared ones. Fall back to declaration
                // order for what is left.
                None => {
                    done.append(&mut pending);
                }
            }
        }
        done
    }
}
