//! Capability traits implemented by vendor adapters.
//!
//! A handler is any type implementing [`Reader`], [`Writer`], or
//! [`Check`] independently; the engine depends only on these capability
//! interfaces and composes them per registration.

use crate::{ReadError, WriteError};
use async_trait::async_trait;
use unicli_model::{ConfigNode, ConfigNodeBuilder, Path};
use unicli_session::CliSession;

/// Converts device CLI text into configuration state.
///
/// A reader fetches raw text through the session, extracts fields, and
/// populates the builder for its subtree. When this registration is
/// declared to run after its parent's, the dispatcher guarantees the
/// parent subtree was populated earlier in the same pass.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Populates `builder` with the state of the subtree at `path`.
    async fn read(
        &self,
        path: &Path,
        session: &CliSession,
        builder: &mut ConfigNodeBuilder,
    ) -> Result<(), ReadError>;
}

/// Converts a before/after transition into CLI commands.
///
/// The dispatcher picks the method matching the transition kind; a
/// writer never sees a transition with both sides absent.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Applies a subtree that did not exist before.
    async fn create(
        &self,
        path: &Path,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError>;

    /// Moves a subtree from `before` to `after`.
    async fn update(
        &self,
        path: &Path,
        before: &ConfigNode,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError>;

    /// Removes a subtree that no longer exists in the desired state.
    async fn delete(
        &self,
        path: &Path,
        before: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError>;
}

/// Applicability predicate gating a handler for one transaction.
///
/// Pure and side-effect free; evaluated before every reader or writer
/// invocation. Returning false is not an error — it lets a different
/// registration take over the same path, and the dispatcher reports the
/// path as unhandled if none does.
pub trait Check: Send + Sync {
    /// Decides whether the handler applies to this transition.
    fn applies(&self, path: &Path, before: Option<&ConfigNode>, after: Option<&ConfigNode>)
        -> bool;
}

impl<F> Check for F
where
    F: Fn(&Path, Option<&ConfigNode>, Option<&ConfigNode>) -> bool + Send + Sync,
{
    fn applies(
        &self,
        path: &Path,
        before: Option<&ConfigNode>,
        after: Option<&ConfigNode>,
    ) -> bool {
        self(path, before, after)
    }
}
